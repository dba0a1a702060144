//! Deployment catalog.
//!
//! Shares the [`ModelRegistry`] between the session manager and whatever
//! edits deployments, and persists the full set after every mutation.

use crate::ports::deployment_store::{DeploymentStore, NoDeploymentStore};
use atlas_domain::{DomainError, ModelDeployment, ModelRegistry};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Process-wide set of model deployments.
///
/// Reads take a shared lock; `upsert`/`remove` take an exclusive lock and then
/// save through the [`DeploymentStore`]. A failed save is logged and the
/// in-memory change stands.
pub struct DeploymentCatalog {
    registry: RwLock<ModelRegistry>,
    store: Arc<dyn DeploymentStore>,
}

impl DeploymentCatalog {
    /// Create a catalog over `registry` with no persistence.
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry: RwLock::new(registry),
            store: Arc::new(NoDeploymentStore),
        }
    }

    /// Load the catalog at startup.
    ///
    /// A non-empty persisted set wins; otherwise `fallback` (configured or
    /// built-in deployments) is used. Load errors are logged and treated as
    /// "nothing persisted".
    pub fn load(store: Arc<dyn DeploymentStore>, fallback: Vec<ModelDeployment>) -> Self {
        let persisted = match store.load() {
            Ok(found) => found.filter(|deployments| !deployments.is_empty()),
            Err(e) => {
                warn!("Could not load persisted deployments: {}", e);
                None
            }
        };

        let deployments = match persisted {
            Some(deployments) => {
                info!("Loaded {} persisted deployment(s)", deployments.len());
                deployments
            }
            None => {
                debug!("Using {} configured deployment(s)", fallback.len());
                fallback
            }
        };

        Self {
            registry: RwLock::new(ModelRegistry::from_deployments(deployments)),
            store,
        }
    }

    /// Resolve a deployment; see [`ModelRegistry::resolve`].
    pub fn resolve(&self, model_id: Option<&str>) -> Result<ModelDeployment, DomainError> {
        self.read().resolve(model_id).cloned()
    }

    pub fn get(&self, model_id: &str) -> Option<ModelDeployment> {
        self.read().get(model_id).cloned()
    }

    pub fn list(&self) -> Vec<ModelDeployment> {
        self.read().deployments().to_vec()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Insert or replace a deployment and persist the set.
    pub fn upsert(&self, deployment: ModelDeployment) {
        let mut registry = self.write();
        info!("Upserting deployment '{}'", deployment.id);
        registry.upsert(deployment);
        self.persist(&registry);
    }

    /// Remove a deployment and persist the set.
    ///
    /// Sessions that reference the removed id keep it; they fall back to the
    /// default deployment the next time they resolve.
    pub fn remove(&self, model_id: &str) -> Option<ModelDeployment> {
        let mut registry = self.write();
        let removed = registry.remove(model_id);
        if removed.is_some() {
            info!("Removed deployment '{}'", model_id);
            self.persist(&registry);
        }
        removed
    }

    fn persist(&self, registry: &ModelRegistry) {
        if let Err(e) = self.store.save(registry.deployments()) {
            warn!("Could not persist deployments: {}", e);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ModelRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModelRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}
