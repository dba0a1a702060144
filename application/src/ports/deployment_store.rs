//! Port for persisting the deployment set.
//!
//! The catalog loads deployments once at startup and saves the full set after
//! every mutation. Storage format and location belong to the adapter.

use atlas_domain::ModelDeployment;
use thiserror::Error;

/// Errors raised by a deployment store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent storage for model deployments.
pub trait DeploymentStore: Send + Sync {
    /// Load the persisted deployments. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<Vec<ModelDeployment>>, StoreError>;

    /// Replace the persisted set with `deployments`.
    fn save(&self, deployments: &[ModelDeployment]) -> Result<(), StoreError>;
}

/// Store that keeps nothing, for tests and `--no-config` runs.
pub struct NoDeploymentStore;

impl DeploymentStore for NoDeploymentStore {
    fn load(&self) -> Result<Option<Vec<ModelDeployment>>, StoreError> {
        Ok(None)
    }

    fn save(&self, _deployments: &[ModelDeployment]) -> Result<(), StoreError> {
        Ok(())
    }
}
