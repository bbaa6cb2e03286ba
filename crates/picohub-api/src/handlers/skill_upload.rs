use crate::auth::AuthUser;
use crate::constants::UPLOAD_FIELD_NAME;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use picohub_core::AppError;
use picohub_services::{IngestError, StorageError};
use std::io;
use std::sync::Arc;
use tokio_util::io::StreamReader;

/// Publish a skill package.
///
/// The `file` field is streamed straight into the admission pipeline; the
/// body is never buffered whole. Other fields are ignored.
#[tracing::instrument(
    skip(state, user, multipart),
    fields(user_id = user.user_id, username = %user.username, operation = "upload_skill")
)]
pub async fn upload_skill(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let max_size_bytes = state.pipeline.storage().max_size_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size_bytes))?
    {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }

        tracing::debug!(
            filename = field.file_name().unwrap_or("<none>"),
            "Receiving skill package"
        );

        let reader = StreamReader::new(field.map_err(io::Error::other));
        tokio::pin!(reader);

        let skill = state
            .pipeline
            .ingest(user.user_id, reader)
            .await
            .map_err(|e| ingest_error(e, max_size_bytes))?;

        return Ok((StatusCode::CREATED, Json(skill)));
    }

    Err(AppError::BadRequest("file is required".to_string()).into())
}

fn too_large(max_size_bytes: u64) -> HttpAppError {
    let limit = StorageError::FileTooLarge {
        limit: max_size_bytes,
    };
    HttpAppError(AppError::PayloadTooLarge(limit.to_string()))
}

fn multipart_error(err: MultipartError, max_size_bytes: u64) -> HttpAppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(max_size_bytes);
    }
    HttpAppError(AppError::BadRequest(err.body_text()))
}

/// The request body limit trips inside the multipart stream, so it surfaces
/// as a read failure; report it as the oversized upload it is.
fn ingest_error(err: IngestError, max_size_bytes: u64) -> HttpAppError {
    match err {
        IngestError::Storage(StorageError::SourceRead(ref source))
            if body_limit_exceeded(source) =>
        {
            too_large(max_size_bytes)
        }
        other => other.into(),
    }
}

fn body_limit_exceeded(err: &io::Error) -> bool {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
        .is_some_and(|e| e.status() == StatusCode::PAYLOAD_TOO_LARGE)
}
