//! Chat transport over `reqwest`.

use super::{map_reqwest_error, sse};
use async_trait::async_trait;
use atlas_application::{BehaviorConfig, ChatTransport, TransportError};
use atlas_domain::{HttpMethod, OutboundRequest};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Sends [`OutboundRequest`]s and decodes the JSON (or event-stream) reply.
///
/// Cancellation drops the in-flight request future, which aborts the
/// underlying connection.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &BehaviorConfig) -> Self {
        Self {
            client,
            timeout: config.timeout,
        }
    }

    async fn exchange(&self, request: &OutboundRequest) -> Result<Value, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let streamed = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(sse::is_event_stream);
        let text = response.text().await.map_err(map_reqwest_error)?;
        trace!("Response {} ({} bytes)", status, text.len());

        if !status.is_success() {
            return Err(TransportError::status(status.as_u16(), text));
        }
        if streamed {
            debug!("Collecting event-stream response");
            return Ok(sse::collect(&text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatTransport for ReqwestTransport {
    async fn perform_request(
        &self,
        request: &OutboundRequest,
        cancellation: CancellationToken,
    ) -> Result<Value, TransportError> {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                debug!("Request to {} cancelled", request.url);
                Err(TransportError::Cancelled)
            }
            result = self.exchange(request) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_server;
    use atlas_domain::{
        ChatPayload, ModelContract, ModelDeployment, PayloadMessage, RequestBuilder, Role,
    };
    use serde_json::json;

    fn hi_request(base_url: &str, contract: Option<ModelContract>) -> OutboundRequest {
        let mut deployment = ModelDeployment::new("local", "local-model", base_url);
        deployment.contract = contract;
        let payload = ChatPayload::new(
            "s1",
            vec![PayloadMessage {
                role: Role::User,
                content: "hi".to_string(),
            }],
        );
        RequestBuilder::build(&deployment, &payload)
    }

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&BehaviorConfig::default())
    }

    #[tokio::test]
    async fn test_post_sends_json_body_and_decodes_reply() {
        let (base, captured) = test_server::spawn(
            200,
            "application/json",
            r#"{"choices":[{"message":{"content":"hey"}}]}"#,
        );
        let contract = ModelContract::new(HttpMethod::Post, "/v1/chat/completions")
            .with_header("Authorization", "Bearer test");

        let body = transport()
            .perform_request(&hi_request(&base, Some(contract)), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body["choices"][0]["message"]["content"], "hey");

        let request = captured.recv().unwrap();
        assert_eq!(request.request_line, "POST /v1/chat/completions HTTP/1.1");
        assert_eq!(request.header("authorization"), Some("Bearer test"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        let sent: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(sent["metadata"]["sessionId"], "s1");
    }

    #[tokio::test]
    async fn test_get_carries_payload_in_query() {
        let (base, captured) =
            test_server::spawn(200, "application/json", r#"{"message":{"content":"ok"}}"#);
        let contract = ModelContract::new(HttpMethod::Get, "/infer");

        transport()
            .perform_request(&hi_request(&base, Some(contract)), CancellationToken::new())
            .await
            .unwrap();

        let request = captured.recv().unwrap();
        assert!(request.request_line.starts_with("GET /infer?payload="));
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_carries_body_text() {
        let (base, _captured) = test_server::spawn(503, "text/plain", "model is loading");

        let result = transport()
            .perform_request(&hi_request(&base, None), CancellationToken::new())
            .await;

        assert_eq!(
            result.unwrap_err(),
            TransportError::Status {
                status: 503,
                message: "model is loading".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_error_body_gets_generic_message() {
        let (base, _captured) = test_server::spawn(500, "text/plain", "");

        let err = transport()
            .perform_request(&hi_request(&base, None), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 500");
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let (base, _captured) = test_server::spawn(200, "application/json", "");

        let body = transport()
            .perform_request(&hi_request(&base, None), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let (base, _captured) = test_server::spawn(200, "application/json", "<html>oops</html>");

        let result = transport()
            .perform_request(&hi_request(&base, None), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(TransportError::Decode(_))));
    }

    #[tokio::test]
    async fn test_event_stream_is_collected() {
        let stream = "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"B\"}}]}\n\n\
data: [DONE]\n\n";
        let (base, _captured) = test_server::spawn(200, "text/event-stream", stream);

        let body = transport()
            .perform_request(&hi_request(&base, None), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body, json!({ "choices": [{ "delta": { "content": "AB" } }] }));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_request() {
        let base = test_server::spawn_silent();
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = transport()
            .perform_request(&hi_request(&base, None), token)
            .await;
        assert_eq!(result.unwrap_err(), TransportError::Cancelled);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let base = test_server::spawn_silent();
        let transport = ReqwestTransport::new(&BehaviorConfig {
            timeout: Some(Duration::from_millis(100)),
        });

        let result = transport
            .perform_request(&hi_request(&base, None), CancellationToken::new())
            .await;
        assert_eq!(result.unwrap_err(), TransportError::Timeout);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = transport()
            .perform_request(
                &hi_request(&format!("http://{}", addr), None),
                CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }
}
