//! Chat session domain.
//!
//! - [`entities::ChatSession`] — one ongoing conversation bound to a deployment
//! - [`entities::ChatMessage`] — a single immutable turn within a session
//! - [`entities::SessionStatus`] — the per-session state machine

pub mod entities;
