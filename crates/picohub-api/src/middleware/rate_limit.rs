//! Per-route admission control
//!
//! Each limited route class owns a `RouteRateLimit`; requests are keyed by
//! client IP and rejected with 429 before any handler work once the window's
//! budget is spent.

use crate::error::HttpAppError;
use crate::utils::ip_extraction::client_key;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use picohub_core::AppError;
use picohub_infra::{RateDecision, RateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;

/// Limiter plus the request context needed to key it
pub struct RouteRateLimit {
    pub name: &'static str,
    pub limiter: Arc<RateLimiter>,
    pub trusted_proxy_count: usize,
}

impl RouteRateLimit {
    pub fn new(name: &'static str, limiter: Arc<RateLimiter>, trusted_proxy_count: usize) -> Self {
        Self {
            name,
            limiter,
            trusted_proxy_count,
        }
    }
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: impl ToString) {
    if let Ok(header_value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, header_value);
    }
}

pub async fn rate_limit_middleware(
    State(route): State<Arc<RouteRateLimit>>,
    request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(
        request.headers(),
        socket_addr.as_ref(),
        route.trusted_proxy_count,
    );
    let limit = route.limiter.policy().limit;

    match route.limiter.check(&key).await {
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            set_header(response.headers_mut(), "X-RateLimit-Limit", limit);
            set_header(response.headers_mut(), "X-RateLimit-Remaining", remaining);
            response
        }
        RateDecision::Limited { retry_after } => {
            // Whole seconds, rounded up
            let retry_after_secs =
                (retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)).max(1);
            tracing::warn!(
                route = route.name,
                key = %key,
                path = %request.uri().path(),
                limit,
                retry_after_secs,
                "Rate limit exceeded"
            );

            let mut response =
                HttpAppError(AppError::RateLimited { retry_after_secs }).into_response();
            let headers = response.headers_mut();
            set_header(headers, "X-RateLimit-Limit", limit);
            set_header(headers, "X-RateLimit-Remaining", 0);
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                headers.insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}
