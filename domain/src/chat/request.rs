//! Outbound request construction.
//!
//! A deployment's [`ModelContract`] decides the method, path, headers and an
//! optional body template. The builder fills the template with the session's
//! messages and metadata without overwriting keys the user authored.
//!
//! # Body shapes
//!
//! ```text
//! no template:  { sessionId, messages, metadata: { ..metadata, sessionId } }
//! template:     { ..template, messages, metadata: { ..template.metadata, ..metadata, sessionId },
//!                 session_id?, model?, stream? }      (? = only when the template omits it)
//! GET:          no body; the JSON above goes into the `payload` query parameter
//! ```

use crate::deployment::entities::{HttpMethod, ModelContract, ModelDeployment};
use crate::session::entities::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const CONTENT_TYPE: &str = "Content-Type";
const JSON_MIME: &str = "application/json";
const PAYLOAD_QUERY_KEY: &str = "payload";

/// Role/content pair as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for PayloadMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Logical chat payload, independent of any deployment contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatPayload {
    pub session_id: String,
    pub messages: Vec<PayloadMessage>,
    pub metadata: Map<String, Value>,
}

impl ChatPayload {
    pub fn new(session_id: impl Into<String>, messages: Vec<PayloadMessage>) -> Self {
        Self {
            session_id: session_id.into(),
            messages,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    fn messages_value(&self) -> Value {
        serde_json::to_value(&self.messages).unwrap_or_else(|_| Value::Array(Vec::new()))
    }
}

/// A concrete request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// `None` for GET requests, whose payload travels in the query string.
    pub body: Option<Value>,
}

/// Why a configured request template could not be used.
#[derive(Debug, Error)]
enum TemplateError {
    #[error("template is not valid JSON: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("template must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Builds [`OutboundRequest`]s from deployments and payloads.
pub struct RequestBuilder;

impl RequestBuilder {
    /// Build the wire request for `payload` against `deployment`.
    ///
    /// Never fails: a malformed endpoint falls back to string concatenation
    /// and an unusable template falls back to the default body.
    pub fn build(deployment: &ModelDeployment, payload: &ChatPayload) -> OutboundRequest {
        let contract = deployment.contract.as_ref();
        let method = contract.map(|c| c.http_method).unwrap_or_default();
        let headers = Self::headers(contract);
        let url = Self::resolve_url(deployment);
        let body = Self::body(deployment, payload);

        match method {
            HttpMethod::Get => OutboundRequest {
                method,
                url: Self::with_payload_query(&url, &body),
                headers,
                body: None,
            },
            HttpMethod::Post => OutboundRequest {
                method,
                url,
                headers,
                body: Some(body),
            },
        }
    }

    /// Join the endpoint with the contract path.
    ///
    /// Without a contract the endpoint is used as-is.
    pub fn resolve_url(deployment: &ModelDeployment) -> String {
        let Some(contract) = deployment.contract.as_ref() else {
            return deployment.endpoint.clone();
        };

        let endpoint = deployment.endpoint.as_str();
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{}/", endpoint)
        };
        let relative = contract.path.strip_prefix('/').unwrap_or(&contract.path);

        match Url::parse(&base).and_then(|b| b.join(relative)) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!(
                    "Could not join endpoint '{}' with path '{}' ({}); concatenating",
                    endpoint, contract.path, e
                );
                format!("{}{}", endpoint, contract.path)
            }
        }
    }

    fn headers(contract: Option<&ModelContract>) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), JSON_MIME.to_string());

        if let Some(contract) = contract {
            for (name, value) in &contract.headers {
                headers.retain(|existing: &String, _| !existing.eq_ignore_ascii_case(name));
                headers.insert(name.clone(), value.clone());
            }
        }
        headers
    }

    fn body(deployment: &ModelDeployment, payload: &ChatPayload) -> Value {
        let template = deployment
            .contract
            .as_ref()
            .and_then(|c| c.request_template.as_ref());

        match template.map(Self::parse_template) {
            None | Some(Ok(None)) => Self::default_body(payload),
            Some(Ok(Some(template))) => Self::templated_body(template, deployment, payload),
            Some(Err(e)) => {
                warn!(
                    "Ignoring request template for deployment '{}': {}",
                    deployment.id, e
                );
                Self::default_body(payload)
            }
        }
    }

    /// `Ok(None)` means "no template" (a blank string).
    fn parse_template(template: &Value) -> Result<Option<Map<String, Value>>, TemplateError> {
        match template {
            Value::Object(map) => Ok(Some(map.clone())),
            Value::String(text) if text.trim().is_empty() => Ok(None),
            Value::String(text) => match serde_json::from_str::<Value>(text)? {
                Value::Object(map) => Ok(Some(map)),
                other => Err(TemplateError::NotAnObject(json_kind(&other))),
            },
            Value::Null => Ok(None),
            other => Err(TemplateError::NotAnObject(json_kind(other))),
        }
    }

    fn default_body(payload: &ChatPayload) -> Value {
        let mut metadata = payload.metadata.clone();
        metadata.insert(
            "sessionId".to_string(),
            Value::String(payload.session_id.clone()),
        );

        let mut body = Map::new();
        body.insert(
            "sessionId".to_string(),
            Value::String(payload.session_id.clone()),
        );
        body.insert("messages".to_string(), payload.messages_value());
        body.insert("metadata".to_string(), Value::Object(metadata));
        Value::Object(body)
    }

    fn templated_body(
        mut template: Map<String, Value>,
        deployment: &ModelDeployment,
        payload: &ChatPayload,
    ) -> Value {
        template.insert("messages".to_string(), payload.messages_value());

        let mut metadata = match template.remove("metadata") {
            Some(Value::Object(existing)) => existing,
            _ => Map::new(),
        };
        metadata.extend(payload.metadata.clone());
        metadata.insert(
            "sessionId".to_string(),
            Value::String(payload.session_id.clone()),
        );
        template.insert("metadata".to_string(), Value::Object(metadata));

        template
            .entry("session_id")
            .or_insert_with(|| Value::String(payload.session_id.clone()));
        template
            .entry("model")
            .or_insert_with(|| Value::String(deployment.model_name().to_string()));
        template.entry("stream").or_insert(Value::Bool(false));

        Value::Object(template)
    }

    /// Put the serialized payload into the `payload` query parameter,
    /// replacing any existing one.
    fn with_payload_query(url: &str, body: &Value) -> String {
        let json = body.to_string();

        match Url::parse(url) {
            Ok(mut parsed) => {
                let retained: Vec<(String, String)> = parsed
                    .query_pairs()
                    .filter(|(key, _)| key != PAYLOAD_QUERY_KEY)
                    .map(|(key, value)| (key.into_owned(), value.into_owned()))
                    .collect();
                parsed
                    .query_pairs_mut()
                    .clear()
                    .extend_pairs(retained)
                    .append_pair(PAYLOAD_QUERY_KEY, &json);
                parsed.to_string()
            }
            Err(_) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair(PAYLOAD_QUERY_KEY, &json)
                    .finish();
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{}{}{}", url, separator, encoded)
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hi_payload() -> ChatPayload {
        ChatPayload::new(
            "s1",
            vec![PayloadMessage {
                role: Role::User,
                content: "hi".to_string(),
            }],
        )
    }

    fn deployment_with(contract: ModelContract) -> ModelDeployment {
        ModelDeployment::new("llama", "Llama 3", "http://localhost:8000/v1").with_contract(contract)
    }

    fn query_payload(url: &str) -> Value {
        let parsed = Url::parse(url).unwrap();
        let (_, value) = parsed
            .query_pairs()
            .find(|(key, _)| key == "payload")
            .unwrap();
        serde_json::from_str(&value).unwrap()
    }

    #[test]
    fn test_no_contract_default_body_and_post() {
        let deployment = ModelDeployment::new("llama", "Llama 3", "http://localhost:8000/chat");
        let request = RequestBuilder::build(&deployment, &hi_payload());

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://localhost:8000/chat");
        assert_eq!(
            request.body,
            Some(json!({
                "sessionId": "s1",
                "messages": [{ "role": "user", "content": "hi" }],
                "metadata": { "sessionId": "s1" }
            }))
        );
        assert_eq!(request.headers.get("Content-Type").unwrap(), "application/json");
    }

    #[test]
    fn test_default_body_keeps_payload_metadata() {
        let deployment = ModelDeployment::new("llama", "Llama 3", "http://localhost:8000");
        let mut metadata = Map::new();
        metadata.insert("clipId".to_string(), json!("clip-7"));
        let request = RequestBuilder::build(&deployment, &hi_payload().with_metadata(metadata));

        let body = request.body.unwrap();
        assert_eq!(body["metadata"], json!({ "clipId": "clip-7", "sessionId": "s1" }));
    }

    #[test]
    fn test_url_join_with_contract_path() {
        let deployment = deployment_with(ModelContract::new(HttpMethod::Post, "/chat/completions"));
        assert_eq!(
            RequestBuilder::resolve_url(&deployment),
            "http://localhost:8000/v1/chat/completions"
        );

        let slash_path = ModelDeployment::new("x", "X", "http://localhost:1234/v1/chat/completions")
            .with_contract(ModelContract::new(HttpMethod::Post, "/"));
        assert_eq!(
            RequestBuilder::resolve_url(&slash_path),
            "http://localhost:1234/v1/chat/completions/"
        );
    }

    #[test]
    fn test_url_join_falls_back_to_concatenation() {
        let deployment = ModelDeployment::new("x", "X", "not a url")
            .with_contract(ModelContract::new(HttpMethod::Post, "/infer"));
        assert_eq!(RequestBuilder::resolve_url(&deployment), "not a url/infer");
    }

    #[test]
    fn test_contract_headers_override_content_type() {
        let contract = ModelContract::new(HttpMethod::Post, "/")
            .with_header("content-type", "application/vnd.atlas+json")
            .with_header("Authorization", "Bearer k");
        let request = RequestBuilder::build(&deployment_with(contract), &hi_payload());

        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.headers.get("content-type").unwrap(),
            "application/vnd.atlas+json"
        );
        assert_eq!(request.headers.get("Authorization").unwrap(), "Bearer k");
    }

    #[test]
    fn test_template_fills_missing_keys_only() {
        let contract = ModelContract::new(HttpMethod::Post, "/").with_template(json!(
            "{\"temperature\": 0.2, \"messages\": [{\"role\": \"system\", \"content\": \"x\"}]}"
        ));
        let request = RequestBuilder::build(&deployment_with(contract), &hi_payload());
        let body = request.body.unwrap();

        assert_eq!(body["temperature"], json!(0.2));
        assert_eq!(body["messages"], json!([{ "role": "user", "content": "hi" }]));
        assert_eq!(body["metadata"], json!({ "sessionId": "s1" }));
        assert_eq!(body["session_id"], json!("s1"));
        assert_eq!(body["model"], json!("Llama 3"));
        assert_eq!(body["stream"], json!(false));
        assert!(body.get("sessionId").is_none());
    }

    #[test]
    fn test_template_user_values_are_never_overridden() {
        let contract = ModelContract::new(HttpMethod::Post, "/").with_template(json!({
            "model": "auto",
            "stream": true,
            "session_id": "pinned",
            "metadata": { "team": "media", "sessionId": "stale" }
        }));
        let mut metadata = Map::new();
        metadata.insert("clipId".to_string(), json!("c1"));
        let request =
            RequestBuilder::build(&deployment_with(contract), &hi_payload().with_metadata(metadata));
        let body = request.body.unwrap();

        assert_eq!(body["model"], json!("auto"));
        assert_eq!(body["stream"], json!(true));
        assert_eq!(body["session_id"], json!("pinned"));
        assert_eq!(
            body["metadata"],
            json!({ "team": "media", "clipId": "c1", "sessionId": "s1" })
        );
    }

    #[test]
    fn test_template_model_uses_id_when_unnamed() {
        let deployment = ModelDeployment::new("local-llama", "", "http://localhost:8000")
            .with_contract(ModelContract::new(HttpMethod::Post, "/").with_template(json!({})));
        let body = RequestBuilder::build(&deployment, &hi_payload()).body.unwrap();
        assert_eq!(body["model"], json!("local-llama"));
    }

    #[test]
    fn test_malformed_template_falls_back_to_default_body() {
        let contract =
            ModelContract::new(HttpMethod::Post, "/").with_template(json!("{ not json"));
        let request = RequestBuilder::build(&deployment_with(contract), &hi_payload());
        assert_eq!(
            request.body.unwrap(),
            json!({
                "sessionId": "s1",
                "messages": [{ "role": "user", "content": "hi" }],
                "metadata": { "sessionId": "s1" }
            })
        );
    }

    #[test]
    fn test_non_object_template_falls_back_to_default_body() {
        for template in [json!("[1, 2]"), json!(42)] {
            let contract = ModelContract::new(HttpMethod::Post, "/").with_template(template);
            let body = RequestBuilder::build(&deployment_with(contract), &hi_payload())
                .body
                .unwrap();
            assert_eq!(body["sessionId"], json!("s1"));
            assert!(body.get("model").is_none());
        }
    }

    #[test]
    fn test_get_moves_payload_into_query() {
        let contract = ModelContract::new(HttpMethod::Get, "/infer");
        let request = RequestBuilder::build(&deployment_with(contract), &hi_payload());

        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.body.is_none());
        assert!(request.url.starts_with("http://localhost:8000/v1/infer?payload="));
        assert_eq!(query_payload(&request.url)["sessionId"], json!("s1"));
    }

    #[test]
    fn test_get_replaces_existing_payload_param() {
        let deployment = ModelDeployment::new("x", "X", "http://localhost:8000")
            .with_contract(ModelContract::new(HttpMethod::Get, "/infer?payload=old&v=2"));
        let request = RequestBuilder::build(&deployment, &hi_payload());
        let parsed = Url::parse(&request.url).unwrap();

        let pairs: Vec<_> = parsed.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(pairs, vec!["v", "payload"]);
        assert_eq!(query_payload(&request.url)["metadata"]["sessionId"], json!("s1"));
    }

    #[test]
    fn test_get_with_unparsable_url_still_encodes() {
        let deployment = ModelDeployment::new("x", "X", "relative")
            .with_contract(ModelContract::new(HttpMethod::Get, "/infer"));
        let request = RequestBuilder::build(&deployment, &hi_payload());
        assert!(request.url.starts_with("relative/infer?payload=%7B"));
    }
}
