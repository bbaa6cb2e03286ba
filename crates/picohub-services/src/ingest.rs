//! Ingestion orchestrator
//!
//! Sequences one upload through storage, scanning and persistence:
//!
//! 1. `StorageManager::store` streams, hashes and validates the package
//! 2. the `Scanner` classifies the persisted artifact
//! 3. `SkillStore::create` records it with `scan_status = clean`
//!
//! Every rejection after step 1 deletes the artifact before returning, so a
//! failed upload leaves neither a file nor a row behind.

use std::path::Path;
use std::sync::Arc;

use picohub_core::{AppError, NewSkill, ScanStatus, Skill};
use picohub_db::SkillStore;
use picohub_storage::{StorageError, StorageManager};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncRead;

use crate::scanner::{ScanReport, Scanner};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("file flagged by security scan: {0}")]
    Flagged(String),

    #[error("skill with this slug already exists")]
    SlugConflict,

    #[error("failed to record skill: {0}")]
    Persistence(#[source] AppError),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Storage(e) => e.into(),
            IngestError::Flagged(reason) => AppError::ContentFlagged(reason),
            IngestError::SlugConflict => AppError::Conflict(err.to_string()),
            IngestError::Persistence(e) => e,
        }
    }
}

/// Admission pipeline for skill packages
#[derive(Clone)]
pub struct IngestPipeline {
    storage: StorageManager,
    scanner: Arc<dyn Scanner>,
    skills: Arc<dyn SkillStore>,
}

impl IngestPipeline {
    pub fn new(
        storage: StorageManager,
        scanner: Arc<dyn Scanner>,
        skills: Arc<dyn SkillStore>,
    ) -> Self {
        Self {
            storage,
            scanner,
            skills,
        }
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// Admit one package uploaded by `author_id`.
    #[tracing::instrument(skip(self, reader))]
    pub async fn ingest<R>(&self, author_id: i64, reader: R) -> Result<Skill, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let stored = self.storage.store(reader).await?;

        let report = match self.scanner.scan(&stored.path).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, path = %stored.path.display(), "Scan failed, rejecting upload");
                ScanReport::flagged(e.to_string())
            }
        };

        if !report.clean {
            tracing::warn!(
                path = %stored.path.display(),
                slug = %stored.manifest.slug,
                reason = %report.message,
                "Upload flagged by scanner"
            );
            self.discard(&stored.path).await;
            return Err(IngestError::Flagged(report.message));
        }

        if !report.authoritative {
            tracing::warn!(
                slug = %stored.manifest.slug,
                "Skill admitted without an authoritative scan"
            );
        }

        let file_path = stored.path.to_string_lossy().into_owned();
        let new_skill = NewSkill::from_manifest(
            author_id,
            stored.manifest,
            file_path,
            stored.size_bytes as i64,
            stored.sha256,
            ScanStatus::Clean,
        );

        match self.skills.create(new_skill).await {
            Ok(skill) => {
                tracing::info!(
                    skill_id = skill.id,
                    slug = %skill.slug,
                    sha256 = %skill.sha256,
                    "Skill admitted"
                );
                Ok(skill)
            }
            Err(AppError::Conflict(_)) => {
                self.discard(&stored.path).await;
                Err(IngestError::SlugConflict)
            }
            Err(e) => {
                self.discard(&stored.path).await;
                Err(IngestError::Persistence(e))
            }
        }
    }

    /// Resolve a slug to its record and an open handle on the artifact, and
    /// count the download.
    #[tracing::instrument(skip(self))]
    pub async fn open_download(&self, slug: &str) -> Result<(Skill, File), AppError> {
        let skill = self
            .skills
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("skill not found".to_string()))?;
        if skill.file_path.is_empty() {
            return Err(AppError::NotFound(
                "no file available for download".to_string(),
            ));
        }

        let file = self.storage.open(Path::new(&skill.file_path)).await?;
        self.skills.increment_download(slug).await?;

        Ok((skill, file))
    }

    /// Best-effort removal; the original rejection is what callers report.
    async fn discard(&self, path: &Path) {
        if let Err(e) = self.storage.delete(path).await {
            tracing::error!(error = %e, path = %path.display(), "Failed to delete rejected artifact");
        }
    }
}
