//! svgclock/crates/auth-adapters/src/lib.rs
//!
//! Implementations of the `TokenVerifier` port.

pub mod sha256;

pub use sha256::{timing_safe_equal, token_digest_hex, Sha256TokenVerifier, TokenDigestError};
