//! Content scanning capability
//!
//! A scanner classifies a stored artifact as clean or flagged. Errors are
//! never treated as clean by callers.

#[cfg(feature = "clamav")]
mod clamav;
mod noop;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "clamav")]
pub use clamav::ClamAvScanner;
pub use noop::{NoopScanner, RejectAllScanner};

/// Verdict for one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub clean: bool,
    pub message: String,
    /// False when the verdict did not come from a real scanning engine.
    pub authoritative: bool,
}

impl ScanReport {
    pub fn clean(message: impl Into<String>) -> Self {
        Self {
            clean: true,
            message: message.into(),
            authoritative: true,
        }
    }

    pub fn flagged(message: impl Into<String>) -> Self {
        Self {
            clean: false,
            message: message.into(),
            authoritative: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scanner unavailable: {0}")]
    Unavailable(String),

    #[error("scan timed out after {0} seconds")]
    Timeout(u64),

    #[error("scan failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, path: &Path) -> Result<ScanReport, ScanError>;
}
