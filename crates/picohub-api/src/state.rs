use picohub_core::Config;
use picohub_infra::RateLimiter;
use picohub_services::IngestPipeline;
use std::sync::Arc;

/// Shared state handed to every handler
pub struct AppState {
    pub config: Config,
    pub pipeline: IngestPipeline,
    pub upload_limiter: Arc<RateLimiter>,
    pub download_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Stop background work owned by the state (limiter sweeps).
    pub async fn shutdown(&self) {
        self.upload_limiter.shutdown().await;
        self.download_limiter.shutdown().await;
    }
}
