//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat_sessions;
pub mod deployment_catalog;
pub mod discover_models;
