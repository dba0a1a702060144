//! Model registry
//!
//! Holds the configured deployments in insertion order and resolves which one
//! a session should talk to.

use super::entities::ModelDeployment;
use crate::core::error::DomainError;

/// The set of configured model deployments.
///
/// At most one deployment is flagged `default`; [`upsert`](Self::upsert)
/// enforces this by clearing the flag on every other entry.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    deployments: Vec<ModelDeployment>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry by upserting each deployment in order.
    ///
    /// Duplicate ids collapse into the last occurrence and, when several are
    /// flagged default, the last one wins.
    pub fn from_deployments(deployments: impl IntoIterator<Item = ModelDeployment>) -> Self {
        let mut registry = Self::new();
        for deployment in deployments {
            registry.upsert(deployment);
        }
        registry
    }

    /// Resolve a deployment.
    ///
    /// Order: the requested id if it exists, then the deployment flagged
    /// default, then the first configured one. An empty registry yields
    /// [`DomainError::NoModelConfigured`].
    pub fn resolve(&self, model_id: Option<&str>) -> Result<&ModelDeployment, DomainError> {
        if let Some(id) = model_id
            && let Some(found) = self.get(id)
        {
            return Ok(found);
        }

        self.deployments
            .iter()
            .find(|d| d.default)
            .or_else(|| self.deployments.first())
            .ok_or(DomainError::NoModelConfigured)
    }

    /// Insert or fully replace a deployment by id.
    pub fn upsert(&mut self, deployment: ModelDeployment) {
        let is_default = deployment.default;
        let id = deployment.id.clone();

        match self.deployments.iter_mut().find(|d| d.id == id) {
            Some(existing) => *existing = deployment,
            None => self.deployments.push(deployment),
        }

        if is_default {
            for other in self.deployments.iter_mut().filter(|d| d.id != id) {
                other.default = false;
            }
        }
    }

    /// Remove a deployment by id. Sessions referencing it are not touched.
    pub fn remove(&mut self, model_id: &str) -> Option<ModelDeployment> {
        let index = self.deployments.iter().position(|d| d.id == model_id)?;
        Some(self.deployments.remove(index))
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelDeployment> {
        self.deployments.iter().find(|d| d.id == model_id)
    }

    pub fn deployments(&self) -> &[ModelDeployment] {
        &self.deployments
    }

    pub fn default_deployment(&self) -> Option<&ModelDeployment> {
        self.deployments.iter().find(|d| d.default)
    }

    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }
}
