use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
};
use picohub_core::AppError;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

#[tracing::instrument(skip(state), fields(operation = "download_skill"))]
pub async fn download_skill(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response<Body>, HttpAppError> {
    let (skill, file) = state.pipeline.open_download(&slug).await?;
    let content_length = file
        .metadata()
        .await
        .map_err(|e| AppError::Storage(format!("Failed to stat skill package: {}", e)))?
        .len();

    tracing::debug!(
        slug = %skill.slug,
        version = %skill.version,
        content_length,
        "Streaming skill package"
    );

    let content_disposition = format!("attachment; filename={}", skill.download_filename());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .header(header::CONTENT_LENGTH, content_length)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
