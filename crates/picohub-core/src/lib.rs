//! PicoHub Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every PicoHub component: the storage pipeline, the persistence layer, the
//! scanner capability and the HTTP API.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, PipelineConfig, RateLimitPolicy};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Manifest, NewSkill, ScanStatus, Skill};
