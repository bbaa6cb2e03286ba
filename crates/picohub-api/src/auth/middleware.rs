use crate::auth::jwt::JwtValidator;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use picohub_core::AppError;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct AuthState {
    pub validator: JwtValidator,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            validator: JwtValidator::new(jwt_secret),
        }
    }
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "authorization header required".to_string(),
            ))
            .into_response();
        }
    };

    let token = match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => token,
        _ => {
            return HttpAppError(AppError::Unauthorized(
                "invalid authorization format".to_string(),
            ))
            .into_response();
        }
    };

    let user = match auth_state.validator.validate(token) {
        Ok(user) => user,
        Err(e) => return HttpAppError(e).into_response(),
    };

    tracing::debug!(user_id = user.user_id, username = %user.username, "Request authenticated");
    request.extensions_mut().insert(user);

    next.run(request).await
}
