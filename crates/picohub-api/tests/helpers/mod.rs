pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use picohub_api::setup::{routes, services};
use picohub_api::AppState;
use picohub_core::{BaseConfig, Config, PipelineConfig, RateLimitPolicy};
use picohub_db::SqliteSkillStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "picohub-test-secret";

/// Returns the versioned API path: `api_path("/skills")` -> `/api/v1/skills`.
pub fn api_path(path: &str) -> String {
    format!("{}{}", picohub_api::constants::API_PREFIX, path)
}

/// Knobs a test may turn before the app is built
pub struct TestOptions {
    pub max_upload_size_bytes: u64,
    pub upload_rate_limit: RateLimitPolicy,
    pub download_rate_limit: RateLimitPolicy,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            max_upload_size_bytes: 1 << 20,
            upload_rate_limit: RateLimitPolicy::per_minute(100),
            download_rate_limit: RateLimitPolicy::per_minute(100),
        }
    }
}

/// Test application state
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub database_url: String,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_dir(&self) -> PathBuf {
        self._temp_dir.path().join("uploads")
    }

    /// Files currently present in the upload directory
    pub fn stored_files(&self) -> Vec<PathBuf> {
        list_files(&self.upload_dir())
    }

    /// A second connection onto the app's database for assertions
    pub async fn skill_store(&self) -> SqliteSkillStore {
        let pool = picohub_db::connect(&self.database_url, 1)
            .await
            .expect("Failed to open test database");
        SqliteSkillStore::new(pool)
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

/// Setup a test application with an isolated database and upload directory
pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let database_url = format!("sqlite://{}", temp_dir.path().join("picohub.db").display());

    let config = Config(Box::new(PipelineConfig {
        base: BaseConfig {
            server_port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            jwt_secret: TEST_JWT_SECRET.to_string(),
            trusted_proxy_count: 0,
        },
        database_url: database_url.clone(),
        upload_dir: temp_dir.path().join("uploads"),
        max_upload_size_bytes: options.max_upload_size_bytes,
        upload_rate_limit: options.upload_rate_limit,
        download_rate_limit: options.download_rate_limit,
        clamav_enabled: false,
        clamav_host: "localhost".to_string(),
        clamav_port: 3310,
        clamav_timeout_secs: 5,
    }));
    config.validate().expect("Invalid test config");

    let state = services::initialize_services(&config)
        .await
        .expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        database_url,
        _temp_dir: temp_dir,
    }
}
