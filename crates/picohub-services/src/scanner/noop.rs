use std::path::Path;

use async_trait::async_trait;

use super::{ScanError, ScanReport, Scanner};

/// Pass-through scanner for environments without a scanning engine.
///
/// Every artifact is reported clean, but the report is marked
/// non-authoritative and each call logs a warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScanner;

#[async_trait]
impl Scanner for NoopScanner {
    async fn scan(&self, path: &Path) -> Result<ScanReport, ScanError> {
        tracing::warn!(
            path = %path.display(),
            "Scan skipped (noop scanner), result is not authoritative"
        );
        Ok(ScanReport {
            clean: true,
            message: "scan skipped (noop scanner)".to_string(),
            authoritative: false,
        })
    }
}

/// Flags every artifact.
#[derive(Clone, Debug)]
pub struct RejectAllScanner {
    reason: String,
}

impl RejectAllScanner {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for RejectAllScanner {
    fn default() -> Self {
        Self::new("rejected by policy")
    }
}

#[async_trait]
impl Scanner for RejectAllScanner {
    async fn scan(&self, _path: &Path) -> Result<ScanReport, ScanError> {
        Ok(ScanReport::flagged(self.reason.clone()))
    }
}
