//! Settings of the purge coordinator (`SVGCLOCK_PURGE__*`).

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::{environment, non_empty, ConfigError};

pub const ENV_PREFIX: &str = "SVGCLOCK_PURGE";

#[derive(Debug, Deserialize)]
struct RawPurgeSettings {
    bind_address: String,
    auth_token_sha256: Option<String>,
    allowed_hosts: String,
    record_ttl_secs: u64,
    markdown_api_url: String,
    user_agent: String,
    request_timeout_secs: u64,
    sweep_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct PurgeSettings {
    pub bind_address: SocketAddr,
    /// Lowercase hex SHA-256 of the shared bearer token.
    pub auth_token_sha256: String,
    pub allowed_hosts: HashSet<String>,
    pub record_ttl: Duration,
    pub markdown_api_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub sweep_interval: Duration,
}

impl PurgeSettings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    pub fn load_from(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let raw: RawPurgeSettings = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:8081")?
            .set_default("allowed_hosts", "svgclock.abelia.workers.dev")?
            .set_default("record_ttl_secs", 86_400)?
            .set_default("markdown_api_url", "https://api.github.com/markdown")?
            .set_default("user_agent", "purge.deno.dev")?
            .set_default("request_timeout_secs", 10)?
            .set_default("sweep_interval_secs", 300)?
            .add_source(environment(ENV_PREFIX, vars))
            .build()?
            .try_deserialize()?;

        let bind_address = raw
            .bind_address
            .parse()
            .map_err(|e| ConfigError::invalid("bind_address", format!("{e}")))?;

        let auth_token_sha256 = non_empty(raw.auth_token_sha256)
            .ok_or_else(|| ConfigError::invalid("auth_token_sha256", "required"))?
            .to_ascii_lowercase();
        match hex::decode(&auth_token_sha256) {
            Ok(bytes) if bytes.len() == 32 => {}
            Ok(bytes) => {
                return Err(ConfigError::invalid(
                    "auth_token_sha256",
                    format!("expected 32 bytes, got {}", bytes.len()),
                ))
            }
            Err(e) => return Err(ConfigError::invalid("auth_token_sha256", e.to_string())),
        }

        let allowed_hosts = parse_host_list(&raw.allowed_hosts);
        if allowed_hosts.is_empty() {
            return Err(ConfigError::invalid("allowed_hosts", "must name at least one host"));
        }

        if raw.sweep_interval_secs == 0 {
            return Err(ConfigError::invalid("sweep_interval_secs", "must be positive"));
        }

        Ok(Self {
            bind_address,
            auth_token_sha256,
            allowed_hosts,
            record_ttl: Duration::from_secs(raw.record_ttl_secs),
            markdown_api_url: raw.markdown_api_url,
            user_agent: raw.user_agent,
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            sweep_interval: Duration::from_secs(raw.sweep_interval_secs),
        })
    }
}

/// Comma-separated, whitespace-tolerant, case-folded.
fn parse_host_list(list: &str) -> HashSet<String> {
    list.split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b";

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_with_token() {
        let s = PurgeSettings::load_from(vars(&[("SVGCLOCK_PURGE__AUTH_TOKEN_SHA256", DIGEST)]))
            .unwrap();
        assert_eq!(s.bind_address.port(), 8081);
        assert_eq!(s.auth_token_sha256, DIGEST);
        assert_eq!(
            s.allowed_hosts,
            HashSet::from(["svgclock.abelia.workers.dev".to_string()])
        );
        assert_eq!(s.record_ttl, Duration::from_secs(86_400));
        assert_eq!(s.markdown_api_url, "https://api.github.com/markdown");
        assert_eq!(s.user_agent, "purge.deno.dev");
        assert_eq!(s.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn token_digest_is_required() {
        let err = PurgeSettings::load_from(vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "auth_token_sha256", .. }));
    }

    #[test]
    fn token_digest_must_be_sha256_hex() {
        for bad in ["xyz", "abcd"] {
            let err =
                PurgeSettings::load_from(vars(&[("SVGCLOCK_PURGE__AUTH_TOKEN_SHA256", bad)]))
                    .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: "auth_token_sha256", .. }));
        }
    }

    #[test]
    fn host_list_is_split_and_trimmed() {
        let upper = DIGEST.to_uppercase();
        let s = PurgeSettings::load_from(vars(&[
            ("SVGCLOCK_PURGE__AUTH_TOKEN_SHA256", upper.as_str()),
            ("SVGCLOCK_PURGE__ALLOWED_HOSTS", " a.test, B.test ,,"),
        ]))
        .unwrap();
        assert_eq!(s.auth_token_sha256, DIGEST);
        assert_eq!(
            s.allowed_hosts,
            HashSet::from(["a.test".to_string(), "b.test".to_string()])
        );
    }

    #[test]
    fn empty_host_list_is_rejected() {
        let err = PurgeSettings::load_from(vars(&[
            ("SVGCLOCK_PURGE__AUTH_TOKEN_SHA256", DIGEST),
            ("SVGCLOCK_PURGE__ALLOWED_HOSTS", " , "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "allowed_hosts", .. }));
    }
}
