//! OpenAI-compatible model listing over `reqwest`.

use super::map_reqwest_error;
use async_trait::async_trait;
use atlas_application::{BehaviorConfig, ModelDiscoveryPort, TransportError};
use atlas_domain::{DiscoveredModel, DiscoveryEndpoints, ModelListing};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Queries `GET <base>/v1/models`.
#[derive(Debug, Clone)]
pub struct ReqwestModelDiscovery {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestModelDiscovery {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl ModelDiscoveryPort for ReqwestModelDiscovery {
    async fn list_models(
        &self,
        endpoints: &DiscoveryEndpoints,
    ) -> Result<Vec<DiscoveredModel>, TransportError> {
        let mut request = self.client.get(&endpoints.models_url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("{} has no model listing", endpoints.models_url);
            return Ok(Vec::new());
        }

        let text = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(TransportError::status(status.as_u16(), text));
        }

        let listing: ModelListing =
            serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(listing
            .data
            .into_iter()
            .map(|entry| DiscoveredModel::from_listing(entry, endpoints))
            .collect())
    }
}
