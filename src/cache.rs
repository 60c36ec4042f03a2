//! In-memory resolution cache.
//!
//! Entries expire lazily: a read past the TTL reports the entry as absent but
//! leaves it in place until the next `put` for that key or a clear.

use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
    time::{Duration, Instant},
};

use crate::scrape::types::Tier;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub identifier: String,
    pub reference: String,
    pub tier: Tier,
    pub created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub cache_size: usize,
    pub cached_movies: Vec<String>,
}

pub struct ResolutionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, identifier: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(identifier)
            .filter(|entry| !entry.is_expired(self.ttl))
            .cloned()
    }

    pub fn put(&self, identifier: &str, reference: &str, tier: Tier) {
        self.insert(CacheEntry {
            identifier: identifier.to_string(),
            reference: reference.to_string(),
            tier,
            created_at: Instant::now(),
        });
    }

    /// Replace whatever is stored under `entry.identifier`.
    pub(crate) fn insert(&self, entry: CacheEntry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(entry.identifier.clone(), entry);
    }

    pub fn clear(&self, identifier: &str) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identifier)
            .is_some();
        log::info!("cleared cache for {identifier}");
        removed
    }

    pub fn clear_all(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        log::info!("cleared all video url cache");
    }

    /// Snapshot of every stored key, stale ones included.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            cache_size: entries.len(),
            cached_movies: keys,
        }
    }
}
