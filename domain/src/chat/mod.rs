//! Request/response adaptation between sessions and model deployments.
//!
//! - [`request::RequestBuilder`] — turns a deployment contract and a chat
//!   payload into a concrete [`request::OutboundRequest`]
//! - [`response::normalize`] — turns any supported response body into a
//!   [`response::CanonicalChatResponse`]

pub mod request;
pub mod response;
