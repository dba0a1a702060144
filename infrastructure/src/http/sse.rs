//! Server-sent event collection for streaming chat completions.
//!
//! The session layer only ever sees whole replies, so a streamed response is
//! read to the end and folded into a single streaming-delta body that the
//! normalizer already understands.

use serde_json::{Value, json};
use tracing::debug;

const DONE_MARKER: &str = "[DONE]";

/// Whether a `Content-Type` header value denotes an event stream.
pub fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/event-stream"))
}

/// Concatenate the `choices[0].delta.content` of every `data:` event.
///
/// Blank lines, non-data fields and the `[DONE]` marker are skipped;
/// undecodable events are logged and skipped.
pub fn collect_deltas(stream: &str) -> String {
    let mut text = String::new();

    for line in stream.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == DONE_MARKER {
            continue;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(event) => {
                if let Some(delta) = event
                    .pointer("/choices/0/delta/content")
                    .and_then(Value::as_str)
                {
                    text.push_str(delta);
                }
            }
            Err(e) => debug!("Skipping unparsable stream event ({}): {}", e, data),
        }
    }

    text
}

/// Fold an event stream into `{"choices":[{"delta":{"content":...}}]}`.
pub fn collect(stream: &str) -> Value {
    json!({ "choices": [{ "delta": { "content": collect_deltas(stream) } }] })
}
