use super::TEST_JWT_SECRET;
use jsonwebtoken::{encode, EncodingKey, Header};
use picohub_api::auth::JwtClaims;

pub const TEST_USER_ID: i64 = 42;

/// Mint a token for `user_id` expiring `ttl_secs` from now (negative for an
/// already expired token).
pub fn token_for(user_id: i64, ttl_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        user_id,
        username: format!("user{}", user_id),
        is_admin: false,
        exp: now + ttl_secs,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode test token")
}

pub fn test_token() -> String {
    token_for(TEST_USER_ID, 3600)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
