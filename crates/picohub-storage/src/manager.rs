use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use picohub_core::Manifest;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::digest::ContentHasher;
use crate::error::{StorageError, StorageResult};
use crate::validator::validate_archive;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// A package that passed the storage pipeline and now lives at its permanent path
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub path: PathBuf,
    /// Hex SHA-256 computed during the copy that wrote `path`.
    pub sha256: String,
    pub size_bytes: u64,
    pub manifest: Manifest,
}

/// Owns the upload directory and the lifecycle of every file inside it
#[derive(Clone, Debug)]
pub struct StorageManager {
    upload_dir: PathBuf,
    max_size_bytes: u64,
}

impl StorageManager {
    /// Create a new StorageManager, creating `upload_dir` if needed
    ///
    /// # Arguments
    /// * `upload_dir` - Directory holding both in-flight and permanent artifacts
    /// * `max_size_bytes` - Largest accepted upload; one byte more is rejected
    pub async fn new(upload_dir: impl Into<PathBuf>, max_size_bytes: u64) -> StorageResult<Self> {
        let upload_dir = upload_dir.into();

        fs::create_dir_all(&upload_dir).await.map_err(|e| {
            StorageError::Config(format!(
                "Failed to create upload directory {}: {}",
                upload_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            upload_dir,
            max_size_bytes,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Stream `reader` into the upload directory with the configured size limit.
    pub async fn store<R>(&self, reader: R) -> StorageResult<StoredArtifact>
    where
        R: AsyncRead + Unpin,
    {
        self.store_with_limit(reader, self.max_size_bytes).await
    }

    /// Stream `reader` into a temporary file, hashing as it goes, validate the
    /// archive and rename it to `<uuid>.zip`.
    ///
    /// The temporary file is removed on every failure path, including when the
    /// returned future is dropped mid-copy.
    #[tracing::instrument(skip(self, reader), fields(upload_dir = %self.upload_dir.display()))]
    pub async fn store_with_limit<R>(&self, reader: R, limit: u64) -> StorageResult<StoredArtifact>
    where
        R: AsyncRead + Unpin,
    {
        let start = std::time::Instant::now();

        let temp = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".zip")
            .tempfile_in(&self.upload_dir)?;
        let mut file = fs::File::from_std(temp.as_file().try_clone()?);

        let mut source = reader.take(limit.saturating_add(1));
        let mut hasher = ContentHasher::new();
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut written: u64 = 0;

        loop {
            let n = source.read(&mut buf).await.map_err(StorageError::SourceRead)?;
            if n == 0 {
                break;
            }
            written += n as u64;
            if written > limit {
                tracing::debug!(
                    limit_bytes = limit,
                    path = %temp.path().display(),
                    "Upload exceeded size limit"
                );
                return Err(StorageError::FileTooLarge { limit });
            }
            file.write_all(&buf[..n]).await?;
            hasher.update(&buf[..n]);
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let sha256 = hasher.finalize_hex();

        let temp_path = temp.path().to_path_buf();
        let manifest = tokio::task::spawn_blocking(move || validate_archive(&temp_path))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        let final_path = self.upload_dir.join(format!("{}.zip", Uuid::new_v4()));
        temp.persist(&final_path).map_err(|e| StorageError::Io(e.error))?;

        tracing::info!(
            path = %final_path.display(),
            slug = %manifest.slug,
            sha256 = %sha256,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored skill package"
        );

        Ok(StoredArtifact {
            path: final_path,
            sha256,
            size_bytes: written,
            manifest,
        })
    }

    /// Remove a permanent artifact. Empty or already-missing paths are a no-op.
    pub async fn delete(&self, path: &Path) -> StorageResult<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }

        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Deleted skill package");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Skill package already absent");
                Ok(())
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Open a permanent artifact for reading.
    pub async fn open(&self, path: &Path) -> StorageResult<fs::File> {
        match fs::File::open(path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
