//! Model deployment domain.
//!
//! - [`entities::ModelDeployment`] — a configured inference target
//! - [`entities::ModelContract`] — the HTTP shape used to talk to it
//! - [`registry::ModelRegistry`] — the set of deployments and default resolution

pub mod entities;
pub mod registry;
