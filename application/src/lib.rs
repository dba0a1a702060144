//! Application layer for atlas-console
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::BehaviorConfig;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    deployment_store::{DeploymentStore, NoDeploymentStore, StoreError},
    model_discovery::ModelDiscoveryPort,
    transport::{ChatTransport, TransportError},
};
pub use use_cases::chat_sessions::{
    SendMessageOptions, SendOutcome, SessionManager, StartSessionOptions,
};
pub use use_cases::deployment_catalog::DeploymentCatalog;
pub use use_cases::discover_models::DiscoverModelsUseCase;
