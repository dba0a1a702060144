//! Infrastructure layer for atlas-console
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod http;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileConsoleConfig, FileHttpConfig,
    FileLoggingConfig, builtin_deployment,
};
pub use http::{ReqwestModelDiscovery, ReqwestTransport};
pub use logging::JsonlConversationLogger;
pub use store::JsonDeploymentStore;
