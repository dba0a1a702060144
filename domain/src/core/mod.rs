//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] — domain-level errors
//! - [`validation::ConfigIssue`] — structured configuration issues
//! - [`string`] — display helpers for message content

pub mod error;
pub mod string;
pub mod validation;
