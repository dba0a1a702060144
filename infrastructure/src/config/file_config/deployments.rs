//! Deployment records from TOML (`[[deployments]]` tables)
//!
//! Deployments are deserialized straight into the domain
//! [`ModelDeployment`]; this module only validates them and supplies the
//! built-in fallback.

use atlas_domain::{ConfigIssue, ConfigIssueCode, HttpMethod, ModelContract, ModelDeployment};
use serde_json::json;
use std::collections::HashSet;

/// Id of the deployment used when nothing is configured.
pub const BUILTIN_DEPLOYMENT_ID: &str = "lm-studio-local";

/// Local LM Studio instance speaking the OpenAI chat-completions protocol.
pub fn builtin_deployment() -> ModelDeployment {
    let template = json!({
        "model": "local-model",
        "temperature": 0.7,
        "max_tokens": 2000,
        "stream": false,
    });

    ModelDeployment::new(
        BUILTIN_DEPLOYMENT_ID,
        "LM Studio (Local OpenAI-Compatible)",
        "http://localhost:1234/v1",
    )
    .with_description("Local LM Studio instance with OpenAI-compatible API endpoints.")
    .with_concurrency_limit(4)
    .with_contract(ModelContract::new(HttpMethod::Post, "/chat/completions").with_template(template))
    .as_default()
}

/// Check a deployment list, reporting every problem found.
pub fn validate_deployments(deployments: &[ModelDeployment]) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (index, deployment) in deployments.iter().enumerate() {
        let id = deployment.id.trim();
        if id.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyDeploymentId,
                format!("deployments[{}]: id cannot be empty", index),
            ));
            continue;
        }

        if deployment.endpoint.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyEndpoint { id: id.to_string() },
                format!("deployments.{}: endpoint cannot be empty", id),
            ));
        }

        if !seen.insert(id) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::DuplicateDeploymentId { id: id.to_string() },
                format!(
                    "deployments.{}: defined more than once, the last definition wins",
                    id
                ),
            ));
        }
    }

    let defaults: Vec<String> = deployments
        .iter()
        .filter(|d| d.default)
        .map(|d| d.id.clone())
        .collect();
    if defaults.len() > 1 {
        issues.push(ConfigIssue::warning(
            ConfigIssueCode::MultipleDefaults {
                ids: defaults.clone(),
            },
            format!(
                "deployments: {} are all marked default; '{}' takes precedence",
                defaults.join(", "),
                defaults[defaults.len() - 1]
            ),
        ));
    }

    issues
}
