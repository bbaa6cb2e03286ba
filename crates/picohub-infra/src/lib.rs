//! PicoHub Infrastructure Library
//!
//! Shared infrastructure components used by the API binary:
//! - Admission-control rate limiting with a supervised eviction sweep
//! - Telemetry initialization

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{RateDecision, RateLimiter};
