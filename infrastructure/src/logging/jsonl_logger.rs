//! JSONL file writer for conversation events.
//!
//! Each [`ConversationEvent`] is serialized as a single JSON line with
//! `type`, `session_id` and `timestamp` fields, appended to the file via a
//! buffered writer.

use atlas_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use serde_json::{Value, json};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// JSONL conversation logger that writes one JSON object per line.
///
/// Appends to an existing file; every record is flushed as it is written.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open `path` for appending, creating it and its parent directories.
    ///
    /// Returns `None` (after a warning) when the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match Self::open_append(path) {
            Ok(file) => Some(Self {
                writer: Mutex::new(BufWriter::new(file)),
                path: path.to_path_buf(),
            }),
            Err(e) => {
                warn!("Conversation log disabled, cannot open {}: {}", path.display(), e);
                None
            }
        }
    }

    fn open_append(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // Payload fields at the top level; non-object payloads go under "data"
        let mut record = match event.payload {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        record.insert("type".to_string(), json!(event.event_type));
        record.insert("session_id".to_string(), json!(event.session_id));
        record.insert("timestamp".to_string(), json!(timestamp));

        let line = Value::Object(record).to_string();

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{}", line).and_then(|()| writer.flush()) {
            warn!("Failed to write conversation log {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_jsonl_logger_writes_valid_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.jsonl");
        let logger = JsonlConversationLogger::new(&path).unwrap();

        logger.log(ConversationEvent::new(
            "user_message",
            "s1",
            json!({ "content": "Describe the clip", "model_id": "lm-studio-local" }),
        ));
        logger.log(ConversationEvent::new(
            "assistant_message",
            "s1",
            json!({ "content": "A cat on a skateboard." }),
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line["session_id"], "s1");
            assert!(line.get("timestamp").is_some());
        }
        assert_eq!(lines[0]["type"], "user_message");
        assert_eq!(lines[0]["model_id"], "lm-studio-local");
        assert_eq!(lines[1]["type"], "assistant_message");
    }

    #[test]
    fn test_jsonl_logger_handles_non_object_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.jsonl");
        let logger = JsonlConversationLogger::new(&path).unwrap();

        logger.log(ConversationEvent::new("session_closed", "s2", Value::Null));
        logger.log(ConversationEvent::new("note", "s2", json!("just a string")));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "session_closed");
        assert!(lines[0].get("data").is_none());
        assert_eq!(lines[1]["data"], "just a string");
    }

    #[test]
    fn test_jsonl_logger_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.jsonl");

        for session in ["a", "b"] {
            let logger = JsonlConversationLogger::new(&path).unwrap();
            logger.log(ConversationEvent::new("session_started", session, json!({})));
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["session_id"], "b");
    }
}
