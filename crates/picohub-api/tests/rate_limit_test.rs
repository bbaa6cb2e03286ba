mod helpers;

use helpers::auth::{bearer, test_token};
use helpers::fixtures::{skill_package, upload_form};
use helpers::{api_path, setup_test_app_with, TestOptions};
use picohub_core::RateLimitPolicy;

#[tokio::test]
async fn test_download_rate_limit_returns_429() {
    let app = setup_test_app_with(TestOptions {
        download_rate_limit: RateLimitPolicy::per_minute(3),
        ..TestOptions::default()
    })
    .await;
    let client = app.client();

    for i in 0..3 {
        let response = client.get(&api_path("/skills/missing/download")).await;
        assert_eq!(response.status_code(), 404, "request {} should be admitted", i);
        let remaining = response.headers().get("X-RateLimit-Remaining").unwrap();
        assert_eq!(remaining.to_str().unwrap(), (2 - i).to_string());
    }

    let response = client.get(&api_path("/skills/missing/download")).await;
    assert_eq!(response.status_code(), 429);

    let headers = response.headers();
    assert_eq!(headers.get("X-RateLimit-Limit").unwrap(), "3");
    assert_eq!(headers.get("X-RateLimit-Remaining").unwrap(), "0");
    let retry_after: u64 = headers
        .get("Retry-After")
        .expect("Retry-After header")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_rate_limit_runs_before_authentication() {
    let app = setup_test_app_with(TestOptions {
        upload_rate_limit: RateLimitPolicy::per_minute(2),
        ..TestOptions::default()
    })
    .await;
    let client = app.client();

    for _ in 0..2 {
        let response = client
            .post(&api_path("/skills"))
            .multipart(upload_form(skill_package("anon", "1.0.0")))
            .await;
        assert_eq!(response.status_code(), 401);
    }

    // Budget is spent even for a valid token
    let response = client
        .post(&api_path("/skills"))
        .add_header("Authorization", bearer(&test_token()))
        .multipart(upload_form(skill_package("anon", "1.0.0")))
        .await;
    assert_eq!(response.status_code(), 429);
    assert!(response.headers().get("Retry-After").is_some());
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let app = setup_test_app_with(TestOptions {
        download_rate_limit: RateLimitPolicy::per_minute(1),
        ..TestOptions::default()
    })
    .await;
    let client = app.client();

    let first = client
        .get(&api_path("/skills/missing/download"))
        .add_header("X-Forwarded-For", "203.0.113.10")
        .await;
    assert_eq!(first.status_code(), 404);

    let limited = client
        .get(&api_path("/skills/missing/download"))
        .add_header("X-Forwarded-For", "203.0.113.10")
        .await;
    assert_eq!(limited.status_code(), 429);

    let other_client = client
        .get(&api_path("/skills/missing/download"))
        .add_header("X-Forwarded-For", "203.0.113.11")
        .await;
    assert_eq!(other_client.status_code(), 404);
}

#[tokio::test]
async fn test_upload_and_download_limits_are_independent() {
    let app = setup_test_app_with(TestOptions {
        upload_rate_limit: RateLimitPolicy::per_minute(1),
        download_rate_limit: RateLimitPolicy::per_minute(5),
        ..TestOptions::default()
    })
    .await;
    let client = app.client();

    let upload = client
        .post(&api_path("/skills"))
        .add_header("Authorization", bearer(&test_token()))
        .multipart(upload_form(skill_package("independent", "1.0.0")))
        .await;
    assert_eq!(upload.status_code(), 201);

    let throttled = client
        .post(&api_path("/skills"))
        .add_header("Authorization", bearer(&test_token()))
        .multipart(upload_form(skill_package("independent2", "1.0.0")))
        .await;
    assert_eq!(throttled.status_code(), 429);

    let download = client
        .get(&api_path("/skills/independent/download"))
        .await;
    assert_eq!(download.status_code(), 200);
}
