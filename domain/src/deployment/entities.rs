//! Deployment entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP method a contract uses to reach a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

/// The user-declared HTTP shape for talking to a deployment.
///
/// `request_template` is either a JSON object or a string holding JSON text.
/// Anything else is treated as unusable by the request builder, which then
/// falls back to the default payload shape.
///
/// Field names accept the camelCase spelling used by exported admin-console
/// settings as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelContract {
    #[serde(default, alias = "httpMethod")]
    pub http_method: HttpMethod,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(
        default,
        alias = "requestTemplate",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_template: Option<serde_json::Value>,
    /// Free-text notes on how responses map to messages. Informational only.
    #[serde(
        default,
        alias = "responseMapping",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_mapping: Option<String>,
}

impl ModelContract {
    pub fn new(http_method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            http_method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_template(mut self, template: serde_json::Value) -> Self {
        self.request_template = Some(template);
        self
    }
}

/// A configured inference target (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDeployment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub default: bool,
    /// Advisory only; nothing in the session layer enforces it.
    #[serde(
        default,
        alias = "concurrencyLimit",
        skip_serializing_if = "Option::is_none"
    )]
    pub concurrency_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ModelContract>,
}

impl ModelDeployment {
    pub fn new(id: impl Into<String>, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            endpoint: endpoint.into(),
            description: None,
            default: false,
            concurrency_limit: None,
            contract: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_contract(mut self, contract: ModelContract) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn with_concurrency_limit(mut self, limit: u32) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Name sent as `model` in templated requests: the display name, or the id
    /// when no name is set.
    pub fn model_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

impl std::fmt::Display for ModelDeployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.model_name(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_defaults_to_post() {
        assert_eq!(HttpMethod::default(), HttpMethod::Post);
        assert_eq!(ModelContract::default().http_method, HttpMethod::Post);
    }

    #[test]
    fn test_http_method_parse() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("POST".parse::<HttpMethod>(), Ok(HttpMethod::Post));
        assert!("PUT".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_model_name_falls_back_to_id() {
        let named = ModelDeployment::new("llama", "Llama 3", "http://localhost:8000");
        assert_eq!(named.model_name(), "Llama 3");

        let unnamed = ModelDeployment::new("llama", "", "http://localhost:8000");
        assert_eq!(unnamed.model_name(), "llama");
    }

    #[test]
    fn test_deserialize_camel_case_export() {
        let json = serde_json::json!({
            "id": "lm-studio-local",
            "name": "LM Studio",
            "endpoint": "http://localhost:1234/v1/chat/completions",
            "default": true,
            "concurrencyLimit": 4,
            "contract": {
                "httpMethod": "POST",
                "path": "/",
                "headers": { "Authorization": "Bearer x" },
                "requestTemplate": "{\"temperature\": 0.7}"
            }
        });

        let deployment: ModelDeployment = serde_json::from_value(json).unwrap();
        assert!(deployment.default);
        assert_eq!(deployment.concurrency_limit, Some(4));
        let contract = deployment.contract.unwrap();
        assert_eq!(contract.http_method, HttpMethod::Post);
        assert_eq!(contract.headers.get("Authorization").unwrap(), "Bearer x");
        assert!(contract.request_template.unwrap().is_string());
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let deployment = ModelDeployment::new("a", "A", "http://a");
        let value = serde_json::to_value(&deployment).unwrap();
        assert!(value.get("contract").is_none());
        assert!(value.get("description").is_none());
        assert_eq!(value["default"], false);
    }
}
