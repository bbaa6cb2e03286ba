use std::path::{Path, PathBuf};
use std::str;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use clamav_client::{clean, Tcp};

use super::{ScanError, ScanReport, Scanner};

/// Scanner backed by a clamd daemon over TCP.
///
/// Connection failures, unparseable responses and timeouts are returned as
/// errors so callers can fail closed.
#[derive(Clone, Debug)]
pub struct ClamAvScanner {
    host: String,
    port: u16,
    /// Timeout in seconds for each scan operation
    timeout_secs: u64,
}

impl ClamAvScanner {
    /// Create a new ClamAvScanner.
    ///
    /// # Arguments
    /// * `host` - ClamAV daemon hostname
    /// * `port` - ClamAV daemon port (typically 3310)
    /// * `timeout_secs` - Upper bound for a single scan
    pub fn new(host: String, port: u16, timeout_secs: u64) -> Self {
        Self {
            host,
            port,
            timeout_secs,
        }
    }
}

/// Extract the signature name from a `stream: <Name> FOUND` response.
fn signature_name(response: &[u8]) -> String {
    let response = str::from_utf8(response).map(str::trim).unwrap_or("unknown");
    if !response.contains("FOUND") {
        return "unknown".to_string();
    }
    response
        .split(':')
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("unknown")
        .to_string()
}

fn scan_blocking(path: PathBuf, address: String) -> Result<ScanReport, ScanError> {
    let connection = Tcp {
        host_address: address.as_str(),
    };
    let response = clamav_client::scan_file(&path, connection, None)
        .map_err(|e| ScanError::Unavailable(format!("ClamAV scan error: {}", e)))?;
    let is_clean = clean(&response)
        .map_err(|e| ScanError::Failed(format!("Failed to parse ClamAV response: {}", e)))?;

    if is_clean {
        Ok(ScanReport::clean("no threats found"))
    } else {
        Ok(ScanReport::flagged(signature_name(&response)))
    }
}

#[async_trait]
impl Scanner for ClamAvScanner {
    async fn scan(&self, path: &Path) -> Result<ScanReport, ScanError> {
        let start = Instant::now();
        tracing::debug!(host = %self.host, port = %self.port, path = %path.display(), "Starting ClamAV scan");

        let address = format!("{}:{}", self.host, self.port);
        let path = path.to_path_buf();
        let result = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            tokio::task::spawn_blocking(move || scan_blocking(path, address)),
        )
        .await;

        let report = match result {
            Ok(Ok(report)) => report?,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "ClamAV scan panicked");
                return Err(ScanError::Failed(format!("ClamAV scan task join error: {}", e)));
            }
            Err(_) => {
                tracing::error!(timeout_secs = self.timeout_secs, "ClamAV scan timeout");
                return Err(ScanError::Timeout(self.timeout_secs));
            }
        };

        if report.clean {
            tracing::info!(
                duration_ms = start.elapsed().as_millis(),
                "File scan completed: clean"
            );
        } else {
            tracing::warn!(
                duration_ms = start.elapsed().as_millis(),
                virus = %report.message,
                "File scan detected virus"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_name_parsing() {
        assert_eq!(
            signature_name(b"stream: Win.Test.EICAR_HDB-1 FOUND\0"),
            "Win.Test.EICAR_HDB-1"
        );
        assert_eq!(signature_name(b"stream: OK\0"), "unknown");
        assert_eq!(signature_name(&[0xff, 0xfe]), "unknown");
    }

    #[tokio::test]
    async fn unreachable_daemon_is_an_error() {
        let scanner = ClamAvScanner::new("127.0.0.1".to_string(), 1, 5);
        let missing = std::env::temp_dir().join("picohub-clamav-missing.zip");
        assert!(scanner.scan(&missing).await.is_err());
    }
}
