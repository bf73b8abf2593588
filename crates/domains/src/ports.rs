//! # Ports
//!
//! Every adapter implements one of these traits; services only see the traits.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

/// Source of "now", injectable so renders are reproducible in tests.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    /// Current Unix time in milliseconds.
    fn now_millis(&self) -> i64;
}

/// Short-lived memo of image URL -> proxy cache-entry URL.
///
/// Reads may be stale; a miss only costs an extra upstream lookup.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PurgeRecordStore: Send + Sync {
    async fn get(&self, image_url: &str) -> Result<Option<String>>;
    async fn put(&self, image_url: &str, cache_entry_url: &str, ttl: Duration) -> Result<()>;
}

/// Maps an image URL to the URL under which the image proxy caches it.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CacheEntryResolver: Send + Sync {
    async fn resolve_cache_entry_url(&self, image_url: &str) -> Result<String>;
}

/// Evicts one entry from the image proxy's cache.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProxyEvictor: Send + Sync {
    async fn evict(&self, cache_entry_url: &str) -> Result<()>;
}

/// Asks the purge coordinator to purge an image URL.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PurgeNotifier: Send + Sync {
    async fn request_purge(&self, image_url: &str) -> Result<()>;
}

/// Checks a presented bearer token.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> bool;
}
