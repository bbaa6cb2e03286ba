//! Route configuration and setup

use crate::auth::{auth_middleware, AuthState};
use crate::constants::{API_PREFIX, MULTIPART_OVERHEAD_BYTES};
use crate::handlers;
use crate::middleware::{rate_limit_middleware, RouteRateLimit};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use picohub_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState::new(config.jwt_secret()));

    let upload_limit = Arc::new(RouteRateLimit::new(
        "upload",
        state.upload_limiter.clone(),
        config.trusted_proxy_count(),
    ));
    let download_limit = Arc::new(RouteRateLimit::new(
        "download",
        state.download_limiter.clone(),
        config.trusted_proxy_count(),
    ));

    let body_limit = usize::try_from(config.max_upload_size_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    // Last layer added runs first: rate limit, then auth, then the body limit
    let upload = post(handlers::skill_upload::upload_skill)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(auth_state, auth_middleware))
        .layer(from_fn_with_state(upload_limit, rate_limit_middleware));

    let download = get(handlers::skill_download::download_skill)
        .layer(from_fn_with_state(download_limit, rate_limit_middleware));

    let app = Router::new()
        .route(
            &format!("{}/health", API_PREFIX),
            get(handlers::health::health_check),
        )
        .route(&format!("{}/skills", API_PREFIX), upload)
        .route(&format!("{}/skills/{{slug}}/download", API_PREFIX), download)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins()
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any))
}
