//! Database repositories for data access layer
//!
//! Skill rows are the only durable state the admission pipeline produces. The
//! `SkillStore` trait abstracts the backend so the orchestrator can be tested
//! against an in-memory SQLite pool.

pub mod skill;

pub use skill::{connect, SkillStore, SqliteSkillStore};
