//! Response normalization.
//!
//! Model endpoints answer in several shapes. Each [`ResponseShape`] is a pure
//! matcher/extractor; [`normalize`] tries them in [`ResponseShape::PRIORITY`]
//! order and the first match wins.
//!
//! ```text
//! Direct:           { message: { content }, usage?, latencyMs? }
//! OpenAiCompatible: { choices: [{ message: { content } | delta: { content } | text }], usage?, latency_ms? }
//! OutputBlocks:     { output: { content: [{ text? }] }, usage? }
//! ```

use crate::session::entities::Role;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a response body could not be normalized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model response contained choices but no message content")]
    EmptyChoices,

    #[error("Unrecognised response format from model endpoint")]
    UnrecognisedResponseFormat,
}

/// The shapes a model response may take, in matching priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// `message.content` holds the reply directly.
    Direct,
    /// OpenAI-style `choices` array, including streamed deltas.
    OpenAiCompatible,
    /// `output.content` array of text blocks.
    OutputBlocks,
}

impl ResponseShape {
    pub const PRIORITY: [ResponseShape; 3] = [
        ResponseShape::Direct,
        ResponseShape::OpenAiCompatible,
        ResponseShape::OutputBlocks,
    ];

    /// Try this shape against a response object.
    ///
    /// `None` means the shape does not apply and the next one should be
    /// tried. `Some(Err(_))` means the shape applies but is unusable.
    pub fn extract(
        &self,
        body: &Map<String, Value>,
    ) -> Option<Result<CanonicalChatResponse, ResponseError>> {
        match self {
            ResponseShape::Direct => extract_direct(body).map(Ok),
            ResponseShape::OpenAiCompatible => extract_choices(body),
            ResponseShape::OutputBlocks => extract_output_blocks(body).map(Ok),
        }
    }
}

/// The normalized, shape-independent model reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalChatResponse {
    /// Always [`Role::Assistant`].
    pub role: Role,
    pub content: String,
    /// Usage counters exactly as the endpoint reported them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    pub shape: ResponseShape,
}

impl CanonicalChatResponse {
    fn new(shape: ResponseShape, content: String) -> Self {
        Self {
            role: Role::Assistant,
            content,
            usage: None,
            latency_ms: None,
            shape,
        }
    }

    fn with_usage(mut self, body: &Map<String, Value>) -> Self {
        self.usage = body.get("usage").filter(|u| !u.is_null()).cloned();
        self
    }

    fn with_latency(mut self, body: &Map<String, Value>, key: &str) -> Self {
        self.latency_ms = body.get(key).and_then(Value::as_f64).and_then(|ms| {
            if ms.is_finite() && ms >= 0.0 {
                Some(ms.round() as u64)
            } else {
                None
            }
        });
        self
    }
}

/// Normalize a parsed response body into a [`CanonicalChatResponse`].
pub fn normalize(body: &Value) -> Result<CanonicalChatResponse, ResponseError> {
    let Value::Object(object) = body else {
        return Err(ResponseError::EmptyResponse);
    };

    ResponseShape::PRIORITY
        .iter()
        .find_map(|shape| shape.extract(object))
        .unwrap_or(Err(ResponseError::UnrecognisedResponseFormat))
}

fn extract_direct(body: &Map<String, Value>) -> Option<CanonicalChatResponse> {
    let content = body
        .get("message")?
        .get("content")?
        .as_str()
        .filter(|c| !c.is_empty())?;

    Some(
        CanonicalChatResponse::new(ResponseShape::Direct, content.to_string())
            .with_usage(body)
            .with_latency(body, "latencyMs"),
    )
}

fn extract_choices(
    body: &Map<String, Value>,
) -> Option<Result<CanonicalChatResponse, ResponseError>> {
    let choices = body.get("choices")?.as_array()?;

    let content: String = choices.iter().filter_map(choice_text).collect();
    if content.is_empty() {
        return Some(Err(ResponseError::EmptyChoices));
    }

    Some(Ok(CanonicalChatResponse::new(
        ResponseShape::OpenAiCompatible,
        content,
    )
    .with_usage(body)
    .with_latency(body, "latency_ms")))
}

/// Text of one choice: `message.content`, else `delta.content`, else `text`.
fn choice_text(choice: &Value) -> Option<&str> {
    nested_content(choice, "message")
        .or_else(|| nested_content(choice, "delta"))
        .or_else(|| choice.get("text").and_then(Value::as_str))
}

fn nested_content<'a>(value: &'a Value, outer: &str) -> Option<&'a str> {
    value.get(outer)?.get("content")?.as_str()
}

fn extract_output_blocks(body: &Map<String, Value>) -> Option<CanonicalChatResponse> {
    let blocks = body
        .get("output")?
        .get("content")?
        .as_array()
        .filter(|blocks| !blocks.is_empty())?;

    let content: String = blocks
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();
    if content.trim().is_empty() {
        return None;
    }

    Some(CanonicalChatResponse::new(ResponseShape::OutputBlocks, content).with_usage(body))
}
