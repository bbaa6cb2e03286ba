//! Service wiring: database, storage, scanner, limiters

use crate::state::AppState;
use anyhow::{Context, Result};
use picohub_core::Config;
use picohub_db::SqliteSkillStore;
use picohub_infra::RateLimiter;
use picohub_services::{IngestPipeline, NoopScanner, Scanner, StorageManager};
use std::sync::Arc;

const DB_MAX_CONNECTIONS: u32 = 5;

pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    tracing::info!("Connecting to database...");
    let pool = picohub_db::connect(config.database_url(), DB_MAX_CONNECTIONS).await?;
    let skills = Arc::new(SqliteSkillStore::new(pool));

    let storage = StorageManager::new(config.upload_dir(), config.max_upload_size_bytes())
        .await
        .with_context(|| {
            format!(
                "Failed to prepare upload directory {}",
                config.upload_dir().display()
            )
        })?;
    tracing::info!(
        upload_dir = %config.upload_dir().display(),
        max_upload_size_bytes = config.max_upload_size_bytes(),
        "Storage initialized"
    );

    let scanner = setup_scanner(config)?;
    let pipeline = IngestPipeline::new(storage, scanner, skills);

    let upload_limiter = Arc::new(RateLimiter::with_sweeper(config.upload_rate_limit()));
    let download_limiter = Arc::new(RateLimiter::with_sweeper(config.download_rate_limit()));
    tracing::info!(
        upload_limit = config.upload_rate_limit().limit,
        upload_window_secs = config.upload_rate_limit().window.as_secs(),
        download_limit = config.download_rate_limit().limit,
        download_window_secs = config.download_rate_limit().window.as_secs(),
        "Rate limiting enabled"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        pipeline,
        upload_limiter,
        download_limiter,
    }))
}

fn setup_scanner(config: &Config) -> Result<Arc<dyn Scanner>> {
    if !config.clamav_enabled() {
        tracing::warn!("ClamAV disabled, uploads are admitted without a malware scan");
        return Ok(Arc::new(NoopScanner));
    }

    #[cfg(feature = "clamav")]
    {
        tracing::info!(
            host = %config.clamav_host(),
            port = config.clamav_port(),
            "ClamAV scanning enabled"
        );
        Ok(Arc::new(picohub_services::ClamAvScanner::new(
            config.clamav_host().to_string(),
            config.clamav_port(),
            config.clamav_timeout_secs(),
        )))
    }

    #[cfg(not(feature = "clamav"))]
    {
        Err(anyhow::anyhow!(
            "CLAMAV_ENABLED is true but this build lacks the `clamav` feature"
        ))
    }
}
