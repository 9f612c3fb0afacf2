//! Read-through cache for list queries.
//!
//! Entries are keyed by a serialized fingerprint of the query parameters
//! and hold the raw server page (pre-optimistic-overlay). Expiry is fixed
//! at a TTL from fetch time (default 5 minutes).

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::clock::WallClock;
use crate::core::{GroupKey, ProductFilters, SortOption};
use crate::service::ProductPage;

/// Default entry lifetime.
pub const DEFAULT_CACHE_TTL_MS: u64 = 5 * 60 * 1_000;

/// The composite every fetch is memoized under. Only the debounced search
/// text participates, never the raw keystrokes.
#[derive(Clone, Debug, Serialize)]
pub struct QueryKey {
    pub page: u32,
    pub search: String,
    pub group_by: GroupKey,
    pub sort: SortOption,
    pub filters: ProductFilters,
}

impl QueryKey {
    /// Serialized fingerprint. Struct fields serialize in declaration
    /// order, so equal keys always produce equal strings.
    pub fn fingerprint(&self) -> String {
        // Serialization of these plain data types cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    page: ProductPage,
    expires_at: WallClock,
}

/// TTL map from query fingerprint to raw server page.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<String, CacheEntry>,
    ttl_ms: u64,
}

impl QueryCache {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_ms,
        }
    }

    /// A fresh hit, if any. Expired entries miss (and are left for
    /// `purge_expired`).
    pub fn get(&self, key: &str, now: WallClock) -> Option<&ProductPage> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                debug!(key, "query cache hit");
                Some(&entry.page)
            }
            Some(_) => {
                debug!(key, "query cache entry expired");
                None
            }
            None => {
                debug!(key, "query cache miss");
                None
            }
        }
    }

    pub fn put(&mut self, key: String, page: ProductPage, now: WallClock) {
        self.entries.insert(
            key,
            CacheEntry {
                page,
                expires_at: now.plus(self.ttl_ms),
            },
        );
    }

    pub fn purge_expired(&mut self, now: WallClock) {
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
