//! Domain layer for atlas-console
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Deployments
//!
//! A **deployment** is an addressable model backend plus its **contract**: the
//! HTTP method, path, headers and body template used to talk to it. The
//! [`ModelRegistry`] holds them and resolves which one a session uses.
//!
//! ## Sessions
//!
//! A [`ChatSession`] is one conversation bound to one deployment at a time.
//! Messages are append-only and the session moves through
//! [`SessionStatus`] as requests start, finish or fail.
//!
//! ## Request / Response adaptation
//!
//! - [`RequestBuilder`] turns a contract and a [`ChatPayload`] into an [`OutboundRequest`]
//! - [`normalize`] turns any supported response body into a [`CanonicalChatResponse`]

pub mod chat;
pub mod core;
pub mod deployment;
pub mod discovery;
pub mod session;

// Re-export commonly used types
pub use chat::{
    request::{ChatPayload, OutboundRequest, PayloadMessage, RequestBuilder},
    response::{CanonicalChatResponse, ResponseError, ResponseShape, normalize},
};
pub use core::{
    error::DomainError,
    string::preview,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use deployment::{
    entities::{HttpMethod, ModelContract, ModelDeployment},
    registry::ModelRegistry,
};
pub use discovery::{DiscoveredModel, DiscoveryEndpoints, ModelListing};
pub use session::entities::{
    ChatMessage, ChatSession, DEFAULT_SESSION_TITLE, Role, SessionStatus,
};
