use picohub_core::AppError;
use thiserror::Error;

/// Structural rejection of an uploaded archive
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("symbolic links are not allowed")]
    SymlinkDetected,

    #[error("invalid skill package: {0}")]
    InvalidPackage(String),

    #[error("manifest.json not found in package")]
    NoManifest,
}

/// Storage pipeline errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file exceeds maximum upload size of {limit} bytes")]
    FileTooLarge { limit: u64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The upload stream failed before reaching its end (client disconnect,
    /// malformed multipart body).
    #[error("failed to read upload stream: {0}")]
    SourceRead(#[source] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::SymlinkDetected => AppError::SymlinkDetected,
            ValidationError::NoManifest => AppError::NoManifest,
            ValidationError::InvalidPackage(reason) => AppError::InvalidPackage(reason),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            StorageError::Validation(inner) => inner.into(),
            StorageError::SourceRead(e) => {
                AppError::BadRequest(format!("failed to read upload stream: {}", e))
            }
            StorageError::NotFound(what) => AppError::NotFound(what),
            StorageError::Io(_) | StorageError::Config(_) => AppError::Storage(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picohub_core::ErrorMetadata;

    #[test]
    fn rejections_keep_their_kind_through_app_error() {
        let too_large: AppError = StorageError::FileTooLarge { limit: 10 }.into();
        assert_eq!(too_large.http_status_code(), 413);

        let symlink: AppError = StorageError::from(ValidationError::SymlinkDetected).into();
        assert!(matches!(symlink, AppError::SymlinkDetected));

        let missing: AppError = StorageError::from(ValidationError::NoManifest).into();
        assert!(matches!(missing, AppError::NoManifest));
    }

    #[test]
    fn io_fault_is_an_internal_storage_error() {
        let err: AppError = StorageError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
