//! Data models for the application
//!
//! `manifest` holds the metadata document carried inside every skill package,
//! `skill` holds the durable record created once a package has been admitted.

mod manifest;
mod skill;

pub use manifest::*;
pub use skill::*;
