//! Locally-hosted model discovery.
//!
//! OpenAI-compatible servers (LM Studio, vLLM, llamafile) list their models at
//! `/v1/models`. [`DiscoveryEndpoints`] derives where to look from a base URL
//! and [`DiscoveredModel::from_listing`] maps one listing entry.

use crate::deployment::entities::{HttpMethod, ModelContract, ModelDeployment};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// URLs derived from a discovery base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEndpoints {
    /// Where the model list is fetched from.
    pub models_url: String,
    /// Chat endpoint assigned to models that do not advertise their own.
    pub chat_url: String,
}

impl DiscoveryEndpoints {
    /// Derive endpoints from a base such as `http://host:1234` or
    /// `http://host:1234/v1/`. A blank base disables discovery.
    pub fn from_base(base_url: &str) -> Option<Self> {
        let trimmed = base_url.trim();
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return None;
        }

        let root = if trimmed.ends_with("/v1") {
            trimmed.to_string()
        } else {
            format!("{}/v1", trimmed)
        };
        Some(Self {
            models_url: format!("{}/models", root),
            chat_url: format!("{}/chat/completions", root),
        })
    }
}

/// One entry of an OpenAI-format `/v1/models` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelListingEntry {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
    #[serde(default)]
    pub metadata: Option<ListingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingMetadata {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// The `/v1/models` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelListing {
    #[serde(default)]
    pub data: Vec<ModelListingEntry>,
}

/// A model found on a discovery endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredModel {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, Value>>,
}

impl DiscoveredModel {
    pub fn from_listing(entry: ModelListingEntry, endpoints: &DiscoveryEndpoints) -> Self {
        let metadata = entry.metadata.unwrap_or_default();
        let description = metadata.description.unwrap_or_else(|| match &entry.owned_by {
            Some(owner) => format!("Model: {} ({})", entry.id, owner),
            None => format!("Model: {}", entry.id),
        });
        let endpoint = metadata
            .endpoint
            .unwrap_or_else(|| endpoints.chat_url.clone());

        Self {
            name: entry.id.clone(),
            id: entry.id,
            endpoint,
            description: Some(description),
            metadata: (!metadata.extra.is_empty()).then_some(metadata.extra),
        }
    }

    /// Turn a discovered model into a (non-default) deployment posting to the
    /// advertised endpoint.
    pub fn into_deployment(self) -> ModelDeployment {
        let mut deployment = ModelDeployment::new(self.id, self.name, self.endpoint)
            .with_contract(ModelContract::new(HttpMethod::Post, "/"));
        deployment.description = self.description;
        deployment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoints_from_plain_base() {
        let endpoints = DiscoveryEndpoints::from_base("http://localhost:1234/").unwrap();
        assert_eq!(endpoints.models_url, "http://localhost:1234/v1/models");
        assert_eq!(endpoints.chat_url, "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_endpoints_from_v1_base() {
        let endpoints = DiscoveryEndpoints::from_base("http://localhost:1234/v1").unwrap();
        assert_eq!(endpoints.models_url, "http://localhost:1234/v1/models");
        assert_eq!(endpoints.chat_url, "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_blank_base_disables_discovery() {
        assert!(DiscoveryEndpoints::from_base("").is_none());
        assert!(DiscoveryEndpoints::from_base("  ").is_none());
    }

    #[test]
    fn test_listing_entry_defaults() {
        let listing: ModelListing = serde_json::from_value(json!({
            "object": "list",
            "data": [
                { "id": "qwen2.5-7b", "owned_by": "organization_owner" },
                { "id": "whisper", "metadata": { "endpoint": "http://localhost:8001/asr", "description": "ASR", "gpu": "a100" } }
            ]
        }))
        .unwrap();
        let endpoints = DiscoveryEndpoints::from_base("http://localhost:1234").unwrap();
        let models: Vec<_> = listing
            .data
            .into_iter()
            .map(|entry| DiscoveredModel::from_listing(entry, &endpoints))
            .collect();

        assert_eq!(models[0].name, "qwen2.5-7b");
        assert_eq!(
            models[0].description.as_deref(),
            Some("Model: qwen2.5-7b (organization_owner)")
        );
        assert_eq!(models[0].endpoint, "http://localhost:1234/v1/chat/completions");
        assert!(models[0].metadata.is_none());

        assert_eq!(models[1].endpoint, "http://localhost:8001/asr");
        assert_eq!(models[1].description.as_deref(), Some("ASR"));
        assert_eq!(models[1].metadata.as_ref().unwrap()["gpu"], json!("a100"));
    }

    #[test]
    fn test_into_deployment() {
        let model = DiscoveredModel {
            id: "llama".to_string(),
            name: "llama".to_string(),
            endpoint: "http://localhost:8000/v1/chat/completions".to_string(),
            description: Some("Model: llama".to_string()),
            metadata: None,
        };
        let deployment = model.into_deployment();
        assert!(!deployment.default);
        assert_eq!(deployment.contract.unwrap().http_method, HttpMethod::Post);
        assert_eq!(deployment.description.as_deref(), Some("Model: llama"));
    }
}
