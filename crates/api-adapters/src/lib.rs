//! svgclock/crates/api-adapters/src/lib.rs
//!
//! HTTP surfaces of the edge and the purge coordinator. Handlers translate
//! requests into service calls and map `DomainError` to fixed status/body
//! pairs; no internal detail ever reaches a response body.

#[cfg(feature = "web-axum")]
pub mod edge;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod purge;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
