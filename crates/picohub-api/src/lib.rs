//! PicoHub API Library
//!
//! This crate provides the HTTP API handlers, middleware, and application setup.

mod handlers;
mod middleware;
mod utils;

// Public modules
pub mod auth;
pub mod constants;
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
