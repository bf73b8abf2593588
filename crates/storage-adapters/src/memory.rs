//! # In-memory purge records
//!
//! `DashMap` keyed by image URL. Entries carry their own deadline; reads drop
//! expired entries lazily and [`InMemoryPurgeRecordStore::sweep_expired`]
//! clears whatever nobody asked for again.
//!
//! Deadlines use `tokio::time::Instant` so paused-clock tests can step past
//! them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{PurgeRecordStore, Result};
use tokio::time::Instant;

/// Deadline used when `now + ttl` does not fit in an `Instant`.
const NEVER: Duration = Duration::from_secs(30 * 365 * 86_400);

#[derive(Debug, Clone)]
struct Entry {
    cache_entry_url: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local store. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPurgeRecordStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl InMemoryPurgeRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every expired entry. Returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "swept expired purge records");
        }
        removed
    }
}

#[async_trait]
impl PurgeRecordStore for InMemoryPurgeRecordStore {
    async fn get(&self, image_url: &str) -> Result<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(image_url) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.cache_entry_url.clone()));
            }
        }
        // Guard released above; re-check under the write lock so a fresh put
        // racing with us is not removed.
        self.entries
            .remove_if(image_url, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn put(&self, image_url: &str, cache_entry_url: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now + NEVER);
        self.entries.insert(
            image_url.to_string(),
            Entry {
                cache_entry_url: cache_entry_url.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}
