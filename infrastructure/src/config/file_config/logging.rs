//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// # Example
///
/// ```toml
/// [logging]
/// conversation_log = "~/.local/share/atlas-console/conversation.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL conversation transcript path. Disabled when unset.
    pub conversation_log: Option<String>,
}

impl FileLoggingConfig {
    /// Transcript path with a leading `~` expanded to the home directory.
    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        let raw = self.conversation_log.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None => Some(PathBuf::from(raw)),
        }
    }
}
