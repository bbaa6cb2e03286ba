//! PicoHub Services Layer
//!
//! This crate is the **business service layer**: the scanner capability and
//! the ingestion orchestrator that sequences storage, scanning and persistence
//! and owns the rollback ordering between them. Keep thin HTTP handling in
//! picohub-api.

pub mod ingest;
pub mod scanner;

pub use ingest::{IngestError, IngestPipeline};
#[cfg(feature = "clamav")]
pub use scanner::ClamAvScanner;
pub use scanner::{NoopScanner, RejectAllScanner, ScanError, ScanReport, Scanner};
pub use picohub_storage::{StorageError, StorageManager, StoredArtifact};
