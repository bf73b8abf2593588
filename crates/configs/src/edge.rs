//! Settings of the image-serving edge (`SVGCLOCK_EDGE__*`).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::{environment, non_empty, ConfigError};

pub const ENV_PREFIX: &str = "SVGCLOCK_EDGE";

#[derive(Debug, Deserialize)]
struct RawEdgeSettings {
    bind_address: String,
    public_origin: Option<String>,
    purge_endpoint: String,
    purge_token: Option<String>,
    purge_delay_ms: u64,
    proxy_marker: String,
    proxy_timestamp_offset_ms: i64,
    static_max_age_secs: u64,
    repository_url: String,
    user_agent: String,
    request_timeout_secs: u64,
}

#[derive(Debug)]
pub struct EdgeSettings {
    pub bind_address: SocketAddr,
    /// Scheme and authority used to rebuild request URLs. When unset the
    /// `X-Forwarded-Proto` and `Host` headers are used.
    pub public_origin: Option<String>,
    pub purge_endpoint: String,
    /// Deferred purges are disabled without a token.
    pub purge_token: Option<SecretString>,
    pub purge_delay: Duration,
    pub proxy_marker: String,
    pub proxy_timestamp_offset_ms: i64,
    pub static_max_age_secs: u64,
    pub repository_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl EdgeSettings {
    /// Reads the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Reads `vars` instead of the process environment when given.
    pub fn load_from(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let raw: RawEdgeSettings = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("purge_endpoint", "https://purge.deno.dev/purge/github")?
            .set_default("purge_delay_ms", 1000)?
            .set_default("proxy_marker", "camo")?
            .set_default("proxy_timestamp_offset_ms", 200)?
            .set_default("static_max_age_secs", 31_536_000)?
            .set_default("repository_url", "https://github.com/SegaraRai/svgclock")?
            .set_default("user_agent", "svg-clock/1.0.0")?
            .set_default("request_timeout_secs", 10)?
            .add_source(environment(ENV_PREFIX, vars))
            .build()?
            .try_deserialize()?;

        let bind_address = raw
            .bind_address
            .parse()
            .map_err(|e| ConfigError::invalid("bind_address", format!("{e}")))?;

        if raw.proxy_marker.trim().is_empty() {
            return Err(ConfigError::invalid("proxy_marker", "must not be empty"));
        }

        let public_origin =
            non_empty(raw.public_origin).map(|origin| origin.trim_end_matches('/').to_string());

        Ok(Self {
            bind_address,
            public_origin,
            purge_endpoint: raw.purge_endpoint,
            purge_token: non_empty(raw.purge_token).map(SecretString::from),
            purge_delay: Duration::from_millis(raw.purge_delay_ms),
            proxy_marker: raw.proxy_marker,
            proxy_timestamp_offset_ms: raw.proxy_timestamp_offset_ms,
            static_max_age_secs: raw.static_max_age_secs,
            repository_url: raw.repository_url,
            user_agent: raw.user_agent,
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults() {
        let s = EdgeSettings::load_from(vars(&[])).unwrap();
        assert_eq!(s.bind_address, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(s.purge_endpoint, "https://purge.deno.dev/purge/github");
        assert!(s.purge_token.is_none());
        assert!(s.public_origin.is_none());
        assert_eq!(s.purge_delay, Duration::from_millis(1000));
        assert_eq!(s.proxy_marker, "camo");
        assert_eq!(s.proxy_timestamp_offset_ms, 200);
        assert_eq!(s.static_max_age_secs, 31_536_000);
        assert_eq!(s.user_agent, "svg-clock/1.0.0");
    }

    #[test]
    fn overrides() {
        let s = EdgeSettings::load_from(vars(&[
            ("SVGCLOCK_EDGE__BIND_ADDRESS", "127.0.0.1:9000"),
            ("SVGCLOCK_EDGE__PURGE_TOKEN", "tok"),
            ("SVGCLOCK_EDGE__PURGE_DELAY_MS", "250"),
            ("SVGCLOCK_EDGE__PUBLIC_ORIGIN", "https://clock.test/"),
        ]))
        .unwrap();
        assert_eq!(s.bind_address.port(), 9000);
        assert_eq!(s.purge_token.unwrap().expose_secret(), "tok");
        assert_eq!(s.purge_delay, Duration::from_millis(250));
        assert_eq!(s.public_origin.as_deref(), Some("https://clock.test"));
    }

    #[test]
    fn blank_token_means_disabled() {
        let s = EdgeSettings::load_from(vars(&[("SVGCLOCK_EDGE__PURGE_TOKEN", "  ")])).unwrap();
        assert!(s.purge_token.is_none());
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let err = EdgeSettings::load_from(vars(&[("SVGCLOCK_EDGE__BIND_ADDRESS", "nowhere")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "bind_address", .. }));
    }

    #[test]
    fn non_numeric_delay_is_a_load_error() {
        let err = EdgeSettings::load_from(vars(&[("SVGCLOCK_EDGE__PURGE_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
