//! # Purge Coordinator
//!
//! Authenticates a purge request, validates the image URL, resolves the
//! proxy's cache-entry URL (memoized for a fixed TTL) and evicts it.
//!
//! The record store is read without any locking; two concurrent misses for
//! the same URL both hit the upstream, which is tolerated.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use domains::{
    CacheEntryResolver, DomainError, ProxyEvictor, PurgePayload, PurgeRecord, PurgeRecordStore,
    Result, TokenVerifier,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use url::Url;

static BEARER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Bearer (\S+)$").expect("static regex"));

#[derive(Debug, Clone)]
pub struct PurgeOptions {
    /// Hosts whose images may be purged.
    pub allowed_hosts: HashSet<String>,
    /// Lifetime of a memoized cache-entry URL.
    pub record_ttl: Duration,
}

impl Default for PurgeOptions {
    fn default() -> Self {
        Self {
            allowed_hosts: HashSet::from(["svgclock.abelia.workers.dev".to_string()]),
            record_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    BEARER_RE
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// True when `token` can be presented as `Bearer <token>`.
pub fn is_bearer_token(token: &str) -> bool {
    bearer_token(&format!("Bearer {token}")) == Some(token)
}

pub struct PurgeCoordinator {
    verifier: Arc<dyn TokenVerifier>,
    store: Arc<dyn PurgeRecordStore>,
    resolver: Arc<dyn CacheEntryResolver>,
    evictor: Arc<dyn ProxyEvictor>,
    options: PurgeOptions,
}

impl PurgeCoordinator {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        store: Arc<dyn PurgeRecordStore>,
        resolver: Arc<dyn CacheEntryResolver>,
        evictor: Arc<dyn ProxyEvictor>,
        options: PurgeOptions,
    ) -> Self {
        Self {
            verifier,
            store,
            resolver,
            evictor,
            options,
        }
    }

    /// Checks the raw `Authorization` header value.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<()> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(DomainError::Unauthorized)?;
        if self.verifier.verify(token) {
            Ok(())
        } else {
            Err(DomainError::Unauthorized)
        }
    }

    /// Parses the JSON body and applies the URL guards: strict round-trip
    /// equality, then the host allow-list.
    pub fn validate_body(&self, body: &[u8]) -> Result<String> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| DomainError::BadRequest(format!("invalid JSON: {e}")))?;
        // serde accepts a JSON array for a struct, so only objects go through.
        if !value.is_object() {
            return Err(DomainError::BadRequest("body is not an object".to_string()));
        }
        let PurgePayload { url } = serde_json::from_value(value)
            .map_err(|e| DomainError::BadRequest(format!("invalid payload: {e}")))?;
        let url = url.as_str();

        let parsed = Url::parse(url).map_err(|e| DomainError::MalformedUrl(e.to_string()))?;
        if parsed.as_str() != url {
            return Err(DomainError::MalformedUrl(format!(
                "normalizes to {}",
                parsed.as_str()
            )));
        }

        let host = parsed.host_str().unwrap_or_default();
        if !self.options.allowed_hosts.contains(host) {
            return Err(DomainError::Forbidden(host.to_string()));
        }

        Ok(url.to_string())
    }

    /// Memoized image URL -> cache-entry URL lookup.
    pub async fn cache_entry_for(&self, image_url: &str) -> Result<String> {
        match self.store.get(image_url).await {
            Ok(Some(cached)) => {
                tracing::debug!(url = %image_url, "purge record hit");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %image_url, error = %e, "purge record read failed"),
        }

        let entry = self.resolver.resolve_cache_entry_url(image_url).await?;
        if let Err(e) = self
            .store
            .put(image_url, &entry, self.options.record_ttl)
            .await
        {
            tracing::warn!(url = %image_url, error = %e, "purge record write failed");
        }
        Ok(entry)
    }

    /// Full request lifecycle. Ok means the proxy accepted the eviction.
    pub async fn purge(&self, authorization: Option<&str>, body: &[u8]) -> Result<PurgeRecord> {
        self.authenticate(authorization)?;
        let image_url = self.validate_body(body)?;
        let cache_entry_url = self.cache_entry_for(&image_url).await?;
        self.evictor.evict(&cache_entry_url).await?;

        tracing::info!(url = %image_url, entry = %cache_entry_url, "evicted proxy cache entry");
        Ok(PurgeRecord {
            image_url,
            cache_entry_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockCacheEntryResolver, MockProxyEvictor, MockPurgeRecordStore, MockTokenVerifier};

    const IMAGE: &str = "https://svgclock.abelia.workers.dev/utc.svg";

    fn verifier(accept: bool) -> Arc<dyn TokenVerifier> {
        let mut v = MockTokenVerifier::new();
        v.expect_verify().return_const(accept);
        Arc::new(v)
    }

    fn coordinator(
        verifier: Arc<dyn TokenVerifier>,
        store: MockPurgeRecordStore,
        resolver: MockCacheEntryResolver,
        evictor: MockProxyEvictor,
    ) -> PurgeCoordinator {
        PurgeCoordinator::new(
            verifier,
            Arc::new(store),
            Arc::new(resolver),
            Arc::new(evictor),
            PurgeOptions::default(),
        )
    }

    fn idle() -> PurgeCoordinator {
        coordinator(
            verifier(true),
            MockPurgeRecordStore::new(),
            MockCacheEntryResolver::new(),
            MockProxyEvictor::new(),
        )
    }

    fn body(url: &str) -> Vec<u8> {
        serde_json::json!({ "url": url }).to_string().into_bytes()
    }

    #[test]
    fn bearer_header_shape() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[test]
    fn tokens_with_whitespace_cannot_be_presented() {
        assert!(is_bearer_token("s3cret-token"));
        assert!(!is_bearer_token(""));
        assert!(!is_bearer_token("two words"));
        assert!(!is_bearer_token("tab\there"));
        assert!(!is_bearer_token("trailing\n"));
    }

    #[test]
    fn missing_or_rejected_token_is_unauthorized() {
        let svc = idle();
        assert_eq!(svc.authenticate(None), Err(DomainError::Unauthorized));
        assert_eq!(svc.authenticate(Some("Token x")), Err(DomainError::Unauthorized));

        let svc = coordinator(
            verifier(false),
            MockPurgeRecordStore::new(),
            MockCacheEntryResolver::new(),
            MockProxyEvictor::new(),
        );
        assert_eq!(svc.authenticate(Some("Bearer nope")), Err(DomainError::Unauthorized));
    }

    #[test]
    fn body_validation() {
        let svc = idle();
        assert!(matches!(svc.validate_body(b"not json"), Err(DomainError::BadRequest(_))));
        assert!(matches!(svc.validate_body(b"{}"), Err(DomainError::BadRequest(_))));
        assert!(matches!(svc.validate_body(br#"{"url":5}"#), Err(DomainError::BadRequest(_))));
        assert!(matches!(svc.validate_body(br#"["x"]"#), Err(DomainError::BadRequest(_))));
        assert_eq!(svc.validate_body(&body(IMAGE)).unwrap(), IMAGE);
    }

    #[test]
    fn urls_must_round_trip_exactly() {
        let svc = idle();
        for url in [
            "https://svgclock.abelia.workers.dev/a ",
            "HTTPS://svgclock.abelia.workers.dev/utc.svg",
            "https://svgclock.abelia.workers.dev",
            "https://svgclock.abelia.workers.dev/./utc.svg",
            "not a url",
        ] {
            assert!(
                matches!(svc.validate_body(&body(url)), Err(DomainError::MalformedUrl(_))),
                "{url}"
            );
        }
    }

    #[test]
    fn foreign_hosts_are_forbidden() {
        let svc = idle();
        assert_eq!(
            svc.validate_body(&body("https://evil.test/utc.svg")),
            Err(DomainError::Forbidden("evil.test".to_string()))
        );
    }

    #[tokio::test]
    async fn miss_resolves_stores_and_evicts() {
        let mut store = MockPurgeRecordStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));
        store
            .expect_put()
            .withf(|url, entry, ttl| {
                url.to_string() == IMAGE
                    && entry.to_string() == "https://camo.test/abc"
                    && *ttl == Duration::from_secs(86_400)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut resolver = MockCacheEntryResolver::new();
        resolver
            .expect_resolve_cache_entry_url()
            .times(1)
            .returning(|_| Ok("https://camo.test/abc".to_string()));
        let mut evictor = MockProxyEvictor::new();
        evictor
            .expect_evict()
            .withf(|entry| entry.to_string() == "https://camo.test/abc")
            .times(1)
            .returning(|_| Ok(()));

        let svc = coordinator(verifier(true), store, resolver, evictor);
        let record = svc.purge(Some("Bearer t"), &body(IMAGE)).await.unwrap();
        assert_eq!(record.cache_entry_url, "https://camo.test/abc");
    }

    #[tokio::test]
    async fn hit_skips_upstream_lookup() {
        let mut store = MockPurgeRecordStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some("https://camo.test/cached".to_string())));
        store.expect_put().times(0);
        let mut resolver = MockCacheEntryResolver::new();
        resolver.expect_resolve_cache_entry_url().times(0);
        let mut evictor = MockProxyEvictor::new();
        evictor.expect_evict().times(1).returning(|_| Ok(()));

        let svc = coordinator(verifier(true), store, resolver, evictor);
        svc.purge(Some("Bearer t"), &body(IMAGE)).await.unwrap();
    }

    #[tokio::test]
    async fn upstream_failures_propagate() {
        let mut store = MockPurgeRecordStore::new();
        store.expect_get().returning(|_| Ok(None));
        let mut resolver = MockCacheEntryResolver::new();
        resolver
            .expect_resolve_cache_entry_url()
            .returning(|_| Err(DomainError::UpstreamStatus(403)));
        let mut evictor = MockProxyEvictor::new();
        evictor.expect_evict().times(0);

        let svc = coordinator(verifier(true), store, resolver, evictor);
        assert_eq!(
            svc.purge(Some("Bearer t"), &body(IMAGE)).await.unwrap_err(),
            DomainError::UpstreamStatus(403)
        );
    }

    #[tokio::test]
    async fn store_read_failure_degrades_to_miss() {
        let mut store = MockPurgeRecordStore::new();
        store
            .expect_get()
            .returning(|_| Err(DomainError::Internal("down".into())));
        store
            .expect_put()
            .returning(|_, _, _| Err(DomainError::Internal("down".into())));
        let mut resolver = MockCacheEntryResolver::new();
        resolver
            .expect_resolve_cache_entry_url()
            .times(1)
            .returning(|_| Ok("https://camo.test/x".to_string()));
        let mut evictor = MockProxyEvictor::new();
        evictor
            .expect_evict()
            .returning(|_| Err(DomainError::UpstreamStatus(404)));

        let svc = coordinator(verifier(true), store, resolver, evictor);
        assert_eq!(
            svc.purge(Some("Bearer t"), &body(IMAGE)).await.unwrap_err(),
            DomainError::UpstreamStatus(404)
        );
    }
}
