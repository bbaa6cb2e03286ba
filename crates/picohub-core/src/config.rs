//! Configuration module
//!
//! This module provides configuration structures for the API and the admission
//! pipeline: server settings, the upload directory, size bounds, per-endpoint
//! rate limit policies and scanner settings.
//!
//! Only `Config::from_env` touches the process environment. Pipeline components
//! receive plain values (paths, byte limits, policies) from the caller.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// Common constants
const SERVER_PORT: u16 = 8080;
const MAX_UPLOAD_SIZE_BYTES: u64 = 10 << 20;
const UPLOAD_RATE_LIMIT: u32 = 10;
const UPLOAD_RATE_WINDOW_SECS: u64 = 60;
const DOWNLOAD_RATE_LIMIT: u32 = 100;
const DOWNLOAD_RATE_WINDOW_SECS: u64 = 60;
const CLAMAV_PORT: u16 = 3310;
const CLAMAV_TIMEOUT_SECS: u64 = 30;
const DEV_JWT_SECRET: &str = "picohub-dev-secret-change-in-production";

/// Request budget for one endpoint class: at most `limit` requests per key
/// within each `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }
}

/// Server-level settings shared by every route
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    /// Number of reverse proxies in front of the server whose
    /// `X-Forwarded-For` entries are trusted. 0 trusts none of them.
    pub trusted_proxy_count: usize,
}

/// Admission pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_size_bytes: u64,
    pub upload_rate_limit: RateLimitPolicy,
    pub download_rate_limit: RateLimitPolicy,
    // ClamAV configuration
    pub clamav_enabled: bool,
    pub clamav_host: String,
    pub clamav_port: u16,
    pub clamav_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PipelineConfig>);

impl Config {
    fn as_pipeline(&self) -> &PipelineConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_pipeline().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PipelineConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_pipeline().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_pipeline().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_pipeline().base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_pipeline().base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_pipeline().base.jwt_secret
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.as_pipeline().base.trusted_proxy_count
    }

    pub fn database_url(&self) -> &str {
        &self.as_pipeline().database_url
    }

    pub fn upload_dir(&self) -> &Path {
        &self.as_pipeline().upload_dir
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.as_pipeline().max_upload_size_bytes
    }

    pub fn upload_rate_limit(&self) -> RateLimitPolicy {
        self.as_pipeline().upload_rate_limit
    }

    pub fn download_rate_limit(&self) -> RateLimitPolicy {
        self.as_pipeline().download_rate_limit
    }

    pub fn clamav_enabled(&self) -> bool {
        self.as_pipeline().clamav_enabled
    }

    pub fn clamav_host(&self) -> &str {
        &self.as_pipeline().clamav_host
    }

    pub fn clamav_port(&self) -> u16 {
        self.as_pipeline().clamav_port
    }

    pub fn clamav_timeout_secs(&self) -> u64 {
        self.as_pipeline().clamav_timeout_secs
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let is_production = is_production_name(&environment);

        let cors_origins_str =
            env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if is_production => {
                return Err(anyhow::anyhow!("JWT_SECRET must be set in production"));
            }
            Err(_) => DEV_JWT_SECRET.to_string(),
        };

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            jwt_secret,
            trusted_proxy_count: env_or("TRUSTED_PROXY_COUNT", 0),
        };

        Ok(Self {
            base,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://picohub.db?mode=rwc".to_string()),
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            ),
            max_upload_size_bytes: env_or("MAX_UPLOAD_SIZE", MAX_UPLOAD_SIZE_BYTES),
            upload_rate_limit: RateLimitPolicy::new(
                env_or("UPLOAD_RATE_LIMIT", UPLOAD_RATE_LIMIT),
                Duration::from_secs(env_or("UPLOAD_RATE_WINDOW_SECS", UPLOAD_RATE_WINDOW_SECS)),
            ),
            download_rate_limit: RateLimitPolicy::new(
                env_or("DOWNLOAD_RATE_LIMIT", DOWNLOAD_RATE_LIMIT),
                Duration::from_secs(env_or(
                    "DOWNLOAD_RATE_WINDOW_SECS",
                    DOWNLOAD_RATE_WINDOW_SECS,
                )),
            ),
            clamav_enabled: env::var("CLAMAV_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            clamav_host: env::var("CLAMAV_HOST").unwrap_or_else(|_| "localhost".to_string()),
            clamav_port: env_or("CLAMAV_PORT", CLAMAV_PORT),
            clamav_timeout_secs: env_or("CLAMAV_TIMEOUT_SECS", CLAMAV_TIMEOUT_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE must be greater than 0"));
        }
        for (name, policy) in [
            ("UPLOAD", self.upload_rate_limit),
            ("DOWNLOAD", self.download_rate_limit),
        ] {
            if policy.limit == 0 {
                return Err(anyhow::anyhow!("{}_RATE_LIMIT must be greater than 0", name));
            }
            if policy.window.is_zero() {
                return Err(anyhow::anyhow!(
                    "{}_RATE_WINDOW_SECS must be greater than 0",
                    name
                ));
            }
        }
        if self.upload_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_DIR must not be empty"));
        }
        if self.clamav_enabled && self.clamav_host.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "CLAMAV_HOST must be set when CLAMAV_ENABLED is true"
            ));
        }
        Ok(())
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Read and parse an environment variable, falling back to `default` when it
/// is unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            base: BaseConfig {
                server_port: 8080,
                environment: "test".to_string(),
                cors_origins: vec!["http://localhost:3000".to_string()],
                jwt_secret: "secret".to_string(),
                trusted_proxy_count: 0,
            },
            database_url: "sqlite::memory:".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_size_bytes: 1024,
            upload_rate_limit: RateLimitPolicy::per_minute(10),
            download_rate_limit: RateLimitPolicy::per_minute(100),
            clamav_enabled: false,
            clamav_host: "localhost".to_string(),
            clamav_port: 3310,
            clamav_timeout_secs: 30,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn zero_upload_size_rejected() {
        let mut config = test_config();
        config.max_upload_size_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_rate_limit_rejected() {
        let mut config = test_config();
        config.download_rate_limit = RateLimitPolicy::per_minute(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DOWNLOAD_RATE_LIMIT"));
    }

    #[test]
    fn zero_rate_window_rejected() {
        let mut config = test_config();
        config.upload_rate_limit = RateLimitPolicy::new(5, Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("UPLOAD_RATE_WINDOW_SECS"));
    }

    #[test]
    fn production_detection() {
        let mut config = test_config();
        config.base.environment = "PROD".to_string();
        assert!(Config(Box::new(config)).is_production());
        assert!(!Config(Box::new(test_config())).is_production());
    }

    #[test]
    fn env_or_falls_back_on_missing_key() {
        let value: u64 = env_or("PICOHUB_TEST_SURELY_UNSET_KEY", 42);
        assert_eq!(value, 42);
    }
}
