//! HTTP configuration from TOML (`[http]` section)

use serde::{Deserialize, Serialize};

/// Raw HTTP configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHttpConfig {
    /// Per-request timeout in seconds. No timeout when unset.
    pub timeout_seconds: Option<u64>,
}
