//! Model discovery port
//!
//! Lists the models an OpenAI-compatible server exposes.

use crate::ports::transport::TransportError;
use async_trait::async_trait;
use atlas_domain::{DiscoveredModel, DiscoveryEndpoints};

/// Adapter that queries a discovery endpoint.
#[async_trait]
pub trait ModelDiscoveryPort: Send + Sync {
    /// Fetch the model list. A server without a listing (HTTP 404) yields an
    /// empty list rather than an error.
    async fn list_models(
        &self,
        endpoints: &DiscoveryEndpoints,
    ) -> Result<Vec<DiscoveredModel>, TransportError>;
}
