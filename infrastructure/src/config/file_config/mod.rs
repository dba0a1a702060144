//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod console;
mod deployments;
mod http;
mod logging;

pub use console::{DEFAULT_DISCOVERY_BASE_URL, FileConsoleConfig};
pub use deployments::{BUILTIN_DEPLOYMENT_ID, builtin_deployment, validate_deployments};
pub use http::FileHttpConfig;
pub use logging::FileLoggingConfig;

use atlas_domain::{ConfigIssue, ConfigIssueCode, ModelDeployment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when the configuration has issues of [`Severity::Error`](atlas_domain::Severity).
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Console URLs
    pub console: FileConsoleConfig,
    /// HTTP transport settings
    pub http: FileHttpConfig,
    /// Conversation transcript settings
    pub logging: FileLoggingConfig,
    /// Configured model deployments
    pub deployments: Vec<ModelDeployment>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = validate_deployments(&self.deployments);

        if let Some(0) = self.http.timeout_seconds {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroTimeout,
                "http.timeout_seconds: cannot be 0",
            ));
        }

        issues
    }

    /// Fail on error-level issues and hand back the warnings.
    pub fn ensure_valid(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.validate().into_iter().partition(ConfigIssue::is_error);

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigValidationError::Invalid(
                errors.into_iter().map(|i| i.message).collect(),
            ))
        }
    }

    /// Configured deployments, or the built-in local deployment when none are.
    pub fn deployments_or_builtin(&self) -> Vec<ModelDeployment> {
        if self.deployments.is_empty() {
            vec![builtin_deployment()]
        } else {
            self.deployments.clone()
        }
    }
}
