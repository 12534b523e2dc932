//! `SprCache`: a TTL-bounded, concurrent `uri_string -> Spr` cache with a
//! periodic background sweep. Concurrent readers never block one another;
//! writes racing to populate the same key are idempotent.

use crate::model::Spr;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

struct CacheEntry {
    value: Spr,
    expires_at: Instant,
}

/// Builds the cache key for a (feature_id, alt_label) pair: `"{id}"` for
/// the canonical geometry, `"{id}-alt-{alt_label}"` otherwise.
pub fn cache_key(feature_id: i64, alt_label: &str) -> String {
    if alt_label.is_empty() {
        feature_id.to_string()
    } else {
        format!("{feature_id}-alt-{alt_label}")
    }
}

pub struct SprCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    sweep_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SprCache {
    /// Creates a cache with the given entry TTL. The caller decides whether
    /// to also call `spawn_sweep`; the cache works without it, just without
    /// proactive eviction of entries nobody reads again.
    pub fn new(ttl: Duration) -> Self {
        SprCache { entries: Arc::new(DashMap::new()), ttl, sweep_handle: std::sync::Mutex::new(None) }
    }

    pub fn get(&self, key: &str) -> Option<Spr> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: String, value: Spr) {
        self.entries.insert(key, CacheEntry { value, expires_at: Instant::now() + self.ttl });
    }

    /// Starts a background task that removes expired entries every
    /// `sweep_interval`. Stopped by dropping the cache or calling
    /// `stop_sweep`.
    pub fn spawn_sweep(&self, sweep_interval: Duration) {
        let entries = Arc::clone(&self.entries);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            loop {
                interval.tick().await;
                let now = Instant::now();
                entries.retain(|_, entry| entry.expires_at > now);
                tracing::debug!(remaining = entries.len(), "spr cache sweep completed");
            }
        });
        *self.sweep_handle.lock().unwrap() = Some(handle);
    }

    /// Stops the sweep task. Takes `&self`: aborting a `JoinHandle` needs
    /// no unique ownership, and the facade may hold this cache behind an
    /// `Arc` shared with in-flight queries.
    pub fn stop_sweep(&self) {
        if let Some(handle) = self.sweep_handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for SprCache {
    fn drop(&mut self) {
        self.stop_sweep();
    }
}
