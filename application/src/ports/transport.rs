//! Chat transport port
//!
//! Defines how a built [`OutboundRequest`] reaches a model deployment.

use async_trait::async_trait;
use atlas_domain::OutboundRequest;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while performing a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-success HTTP status. `message` is the response body text, or a
    /// generic status line when the body was empty.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,
}

impl TransportError {
    /// Build a status error from a response body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.trim().is_empty() {
            format!("Request failed with status {}", status)
        } else {
            body
        };
        TransportError::Status { status, message }
    }

    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

/// Transport for model requests
///
/// Implementations must stop work and return [`TransportError::Cancelled`]
/// once `cancellation` fires. Callers still treat any late completion of a
/// cancelled call as stale.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Perform the request and return the parsed JSON body.
    ///
    /// An empty success body is returned as [`Value::Null`].
    async fn perform_request(
        &self,
        request: &OutboundRequest,
        cancellation: CancellationToken,
    ) -> Result<Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_uses_body_text() {
        let error = TransportError::status(502, "upstream model crashed");
        assert_eq!(error.to_string(), "upstream model crashed");
    }

    #[test]
    fn test_status_error_without_body() {
        let error = TransportError::status(404, "  ");
        assert_eq!(error.to_string(), "Request failed with status 404");
        assert!(matches!(error, TransportError::Status { status: 404, .. }));
    }

    #[test]
    fn test_is_cancelled() {
        assert!(TransportError::Cancelled.is_cancelled());
        assert!(!TransportError::Timeout.is_cancelled());
    }
}
