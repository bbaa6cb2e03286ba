//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded `Config` to a running router:
//! telemetry, the database, the admission pipeline and the route table.

pub mod routes;
pub mod server;
pub mod services;

use crate::constants::SERVICE_NAME;
use crate::state::AppState;
use anyhow::{Context, Result};
use picohub_core::Config;
use picohub_infra::LogFormat;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    let log_format: LogFormat = std::env::var("LOG_FORMAT")
        .unwrap_or_default()
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    picohub_infra::init_telemetry(SERVICE_NAME, config.environment(), log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let state = services::initialize_services(&config).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
