//! Console configuration from TOML (`[console]` section)

use serde::{Deserialize, Serialize};

/// Discovery base used when neither URL is configured.
pub const DEFAULT_DISCOVERY_BASE_URL: &str = "http://localhost:1234";

/// Raw console configuration from TOML
///
/// # Example
///
/// ```toml
/// [console]
/// api_base_url = "http://localhost:8080"
/// discovery_base_url = "http://localhost:1234"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsoleConfig {
    /// Atlas pipeline API base URL
    pub api_base_url: Option<String>,
    /// Base URL of an OpenAI-compatible server to discover models on
    pub discovery_base_url: Option<String>,
}

impl FileConsoleConfig {
    /// Base URL discovery should query.
    ///
    /// `discovery_base_url` when set, else the Atlas API base (which may serve
    /// its own model listing), else the local LM Studio default. An explicitly
    /// empty `discovery_base_url` disables discovery.
    pub fn discovery_base(&self) -> &str {
        self.discovery_base_url
            .as_deref()
            .or(self.api_base_url.as_deref())
            .unwrap_or(DEFAULT_DISCOVERY_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_base_precedence() {
        let mut config = FileConsoleConfig::default();
        assert_eq!(config.discovery_base(), DEFAULT_DISCOVERY_BASE_URL);

        config.api_base_url = Some("http://atlas:8080".to_string());
        assert_eq!(config.discovery_base(), "http://atlas:8080");

        config.discovery_base_url = Some(String::new());
        assert_eq!(config.discovery_base(), "");
    }
}
