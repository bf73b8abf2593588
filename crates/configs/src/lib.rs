//! svgclock/crates/configs/src/lib.rs
//!
//! Environment-driven settings for both services. Loaded once at startup and
//! passed down by value; nothing re-reads the environment afterwards.

pub mod edge;
pub mod error;
pub mod purge;

pub use edge::EdgeSettings;
pub use error::ConfigError;
pub use purge::PurgeSettings;

use std::collections::HashMap;

/// Key/value separator between prefix and field, and between nested fields.
pub const ENV_SEPARATOR: &str = "__";

/// Loads `.env` from the working directory if one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }
}

/// Environment source for `prefix`. `vars` replaces the process
/// environment when given.
pub(crate) fn environment(prefix: &str, vars: Option<HashMap<String, String>>) -> config::Environment {
    config::Environment::with_prefix(prefix)
        .separator(ENV_SEPARATOR)
        .source(vars)
}

/// Treats empty and whitespace-only values as unset.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
