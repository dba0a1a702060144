//! HTTP adapters built on `reqwest`.
//!
//! - [`ReqwestTransport`]: performs built chat requests
//! - [`ReqwestModelDiscovery`]: lists models on OpenAI-compatible servers

mod discovery;
pub mod sse;
mod transport;

pub use discovery::ReqwestModelDiscovery;
pub use transport::ReqwestTransport;

use atlas_application::TransportError;

/// Map a `reqwest` failure onto the transport error taxonomy.
pub(crate) fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_decode() {
        TransportError::Decode(error.to_string())
    } else {
        TransportError::Connection(error.to_string())
    }
}
