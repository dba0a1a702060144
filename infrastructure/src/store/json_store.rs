//! JSON file store for the deployment set.
//!
//! The whole set is written as one pretty-printed JSON array. Writes go to a
//! sibling temp file first and are renamed into place, so a crash mid-save
//! leaves the previous set intact.

use atlas_application::ports::deployment_store::{DeploymentStore, StoreError};
use atlas_domain::ModelDeployment;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// [`DeploymentStore`] backed by a JSON file.
pub struct JsonDeploymentStore {
    path: PathBuf,
}

impl JsonDeploymentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeploymentStore for JsonDeploymentStore {
    fn load(&self) -> Result<Option<Vec<ModelDeployment>>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No saved deployments at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, deployments: &[ModelDeployment]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(deployments)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        debug!(
            "Saved {} deployment(s) to {}",
            deployments.len(),
            self.path.display()
        );
        Ok(())
    }
}
