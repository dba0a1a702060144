//! Application-level configuration.
//!
//! This module provides configuration types that control how adapters behave
//! on behalf of the use cases, such as HTTP timeouts.

use std::time::Duration;

/// Application behavior configuration.
///
/// The session layer imposes no timeout of its own; when one is set here the
/// transport adapter enforces it and reports expiry as an ordinary failure.
#[derive(Debug, Clone, Default)]
pub struct BehaviorConfig {
    /// Maximum time to wait for a model response before timing out.
    pub timeout: Option<Duration>,
}

impl BehaviorConfig {
    /// Creates a BehaviorConfig with a timeout specified in seconds.
    pub fn with_timeout_seconds(seconds: u64) -> Self {
        Self {
            timeout: Some(Duration::from_secs(seconds)),
        }
    }

    /// Creates a BehaviorConfig from an optional timeout in seconds.
    ///
    /// If `seconds` is `None`, no timeout is applied.
    pub fn from_timeout_seconds(seconds: Option<u64>) -> Self {
        Self {
            timeout: seconds.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_timeout_seconds() {
        assert!(BehaviorConfig::from_timeout_seconds(None).timeout.is_none());
        assert_eq!(
            BehaviorConfig::from_timeout_seconds(Some(30)).timeout,
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            BehaviorConfig::with_timeout_seconds(5).timeout,
            Some(Duration::from_secs(5))
        );
    }
}
