//! Discover Models use case.
//!
//! Queries a locally-hosted OpenAI-compatible server for its models and
//! optionally registers them as deployments. Discovery is best-effort: it
//! never fails, an unreachable server just yields nothing.

use crate::ports::model_discovery::ModelDiscoveryPort;
use crate::use_cases::deployment_catalog::DeploymentCatalog;
use atlas_domain::{DiscoveredModel, DiscoveryEndpoints};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct DiscoverModelsUseCase {
    discovery: Arc<dyn ModelDiscoveryPort>,
}

impl DiscoverModelsUseCase {
    pub fn new(discovery: Arc<dyn ModelDiscoveryPort>) -> Self {
        Self { discovery }
    }

    /// List the models served under `base_url`.
    pub async fn execute(&self, base_url: &str) -> Vec<DiscoveredModel> {
        let Some(endpoints) = DiscoveryEndpoints::from_base(base_url) else {
            debug!("Discovery base URL is empty, skipping discovery");
            return Vec::new();
        };

        match self.discovery.list_models(&endpoints).await {
            Ok(models) => {
                info!(
                    "Discovered {} model(s) at {}",
                    models.len(),
                    endpoints.models_url
                );
                models
            }
            Err(e) => {
                warn!("Model discovery at {} failed: {}", endpoints.models_url, e);
                Vec::new()
            }
        }
    }

    /// Discover models and add the ones the catalog does not know yet.
    ///
    /// Existing deployments with the same id are left as configured. Returns
    /// the newly registered models.
    pub async fn register(
        &self,
        base_url: &str,
        catalog: &DeploymentCatalog,
    ) -> Vec<DiscoveredModel> {
        let mut added = Vec::new();
        for model in self.execute(base_url).await {
            if catalog.get(&model.id).is_some() {
                debug!("Deployment '{}' already configured, skipping", model.id);
                continue;
            }
            catalog.upsert(model.clone().into_deployment());
            added.push(model);
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::transport::TransportError;
    use async_trait::async_trait;
    use atlas_domain::{ModelDeployment, ModelRegistry};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockDiscovery {
        responses: Mutex<VecDeque<Result<Vec<DiscoveredModel>, TransportError>>>,
        queried: Mutex<Vec<String>>,
    }

    impl MockDiscovery {
        fn new(responses: Vec<Result<Vec<DiscoveredModel>, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelDiscoveryPort for MockDiscovery {
        async fn list_models(
            &self,
            endpoints: &DiscoveryEndpoints,
        ) -> Result<Vec<DiscoveredModel>, TransportError> {
            self.queried
                .lock()
                .unwrap()
                .push(endpoints.models_url.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn model(id: &str) -> DiscoveredModel {
        DiscoveredModel {
            id: id.to_string(),
            name: id.to_string(),
            endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            description: Some(format!("Model: {}", id)),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_execute_queries_models_url() {
        let port = Arc::new(MockDiscovery::new(vec![Ok(vec![model("qwen")])]));
        let use_case = DiscoverModelsUseCase::new(port.clone());

        let models = use_case.execute("http://localhost:1234/").await;

        assert_eq!(models.len(), 1);
        assert_eq!(
            port.queried.lock().unwrap().as_slice(),
            ["http://localhost:1234/v1/models"]
        );
    }

    #[tokio::test]
    async fn test_blank_base_skips_discovery() {
        let port = Arc::new(MockDiscovery::new(vec![]));
        let use_case = DiscoverModelsUseCase::new(port.clone());

        assert!(use_case.execute("  ").await.is_empty());
        assert!(port.queried.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_yields_empty_list() {
        let port = Arc::new(MockDiscovery::new(vec![Err(TransportError::Connection(
            "refused".to_string(),
        ))]));
        let use_case = DiscoverModelsUseCase::new(port);

        assert!(use_case.execute("http://localhost:1234/v1").await.is_empty());
    }

    #[tokio::test]
    async fn test_register_skips_known_deployments() {
        let port = Arc::new(MockDiscovery::new(vec![Ok(vec![model("known"), model("new")])]));
        let use_case = DiscoverModelsUseCase::new(port);
        let catalog = DeploymentCatalog::new(ModelRegistry::from_deployments(vec![
            ModelDeployment::new("known", "Known", "http://elsewhere/chat").as_default(),
        ]));

        let added = use_case.register("http://localhost:1234", &catalog).await;

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].id, "new");
        assert_eq!(catalog.get("known").unwrap().endpoint, "http://elsewhere/chat");
        let registered = catalog.get("new").unwrap();
        assert!(!registered.default);
        assert_eq!(catalog.resolve(None).unwrap().id, "known");
    }
}
