//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No model deployments configured. Add one to the configuration first.")]
    NoModelConfigured,

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_model_configured_display() {
        let error = DomainError::NoModelConfigured;
        assert!(error.to_string().starts_with("No model deployments configured"));
    }

    #[test]
    fn test_session_not_found_carries_id() {
        let error = DomainError::SessionNotFound("abc".to_string());
        assert_eq!(error.to_string(), "Session not found: abc");
    }
}
