//! PicoHub Storage Library
//!
//! This crate owns the upload directory and everything that happens to an
//! untrusted package before it is trusted: the size-bounded streaming copy,
//! the SHA-256 digest computed during that copy, the structural archive
//! validation, and the atomic rename to a permanent artifact.
//!
//! # Artifact layout
//!
//! - **In flight**: `{upload_dir}/upload-*.zip`, removed on every failure path
//! - **Persisted**: `{upload_dir}/{uuid}.zip`, never derived from the slug

pub mod digest;
pub mod error;
pub mod manager;
pub mod validator;

// Re-export commonly used types
pub use digest::ContentHasher;
pub use error::{StorageError, StorageResult, ValidationError};
pub use manager::{StorageManager, StoredArtifact};
pub use validator::validate_archive;
