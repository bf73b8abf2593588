//! # DomainError
//!
//! Centralized error handling for both services.
//! Adapters map these variants to fixed HTTP status/body pairs.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Unknown route or method
    #[error("not found")]
    NotFound,

    /// Missing or invalid bearer token
    #[error("unauthorized")]
    Unauthorized,

    /// Body is not JSON or lacks a string `url`
    #[error("bad request: {0}")]
    BadRequest(String),

    /// URL does not survive a strict parse round-trip
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    /// URL host is not allow-listed
    #[error("forbidden host: {0}")]
    Forbidden(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned {0}")]
    UpstreamStatus(u16),

    /// Upstream could not be reached or answered with something unusable
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for domain logic.
pub type Result<T> = std::result::Result<T, DomainError>;
