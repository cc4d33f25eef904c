//! Cache Manager Module
//!
//! The only cache interface the rest of the application uses. Adds
//! namespacing, typed access, request coalescing and statistics on top of
//! the [`CacheStore`].

use std::any::type_name;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::cache::keys::{composite_key, namespace_prefix};
use crate::cache::{CacheStats, CacheStatsSnapshot, CacheStore, CacheValue, InFlightRegistry};

#[derive(Debug)]
struct ManagerInner {
    store: CacheStore,
    stats: Mutex<CacheStats>,
    in_flight: InFlightRegistry,
    started_at: Mutex<Instant>,
}

// == Cache Manager ==
/// Namespaced, typed read-through cache handle.
///
/// Cloning is cheap; clones share entries, counters and in-flight fetches.
/// Construct one per process and hand clones to the data-access services.
#[derive(Debug, Clone)]
pub struct CacheManager {
    inner: Arc<ManagerInner>,
}

impl CacheManager {
    // == Constructor ==
    /// Creates a manager over a fresh store.
    pub fn new(proactive_expiry: bool) -> Self {
        Self::with_store(CacheStore::new(proactive_expiry))
    }

    /// Creates a manager over an existing store.
    pub fn with_store(store: CacheStore) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                store,
                stats: Mutex::new(CacheStats::new()),
                in_flight: InFlightRegistry::new(),
                started_at: Mutex::new(Instant::now()),
            }),
        }
    }

    // == Key Generation ==
    /// Deterministic composite key: `namespace + ":" + key`.
    pub fn generate_key(namespace: &str, key: &str) -> String {
        composite_key(namespace, key)
    }

    // == Get ==
    /// Returns the cached value for `(namespace, key)`, counting a hit or a miss.
    ///
    /// The returned `Arc` is a shared read-only snapshot of what was stored.
    ///
    /// # Panics
    /// In debug builds, if the stored value is not a `T`. Release builds log the
    /// mismatch and report a miss.
    pub fn get<T>(&self, namespace: impl AsRef<str>, key: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let composite = composite_key(namespace.as_ref(), key);
        let value = self
            .inner
            .store
            .get(&composite)
            .and_then(|value| downcast::<T>(&composite, value));

        let mut stats = self.inner.stats.lock();
        if value.is_some() {
            stats.record_hit();
            trace!(key = %composite, "Cache hit");
        } else {
            stats.record_miss();
            trace!(key = %composite, "Cache miss");
        }
        value
    }

    // == Set ==
    /// Stores `value` under `(namespace, key)` for `ttl_ms` milliseconds.
    ///
    /// A TTL of 0 means the entry never expires on its own.
    pub fn set<T>(&self, namespace: impl AsRef<str>, key: &str, value: T, ttl_ms: u64)
    where
        T: Send + Sync + 'static,
    {
        self.set_shared(namespace, key, Arc::new(value), ttl_ms);
    }

    /// Stores an already shared value without copying it.
    pub fn set_shared<T>(&self, namespace: impl AsRef<str>, key: &str, value: Arc<T>, ttl_ms: u64)
    where
        T: Send + Sync + 'static,
    {
        let composite = composite_key(namespace.as_ref(), key);
        trace!(key = %composite, ttl_ms, "Cache set");
        let value: CacheValue = value;
        self.inner.store.set(composite, value, ttl_ms);
        self.inner.stats.lock().record_set();
    }

    // == Has ==
    /// True iff `get` would return a value right now.
    ///
    /// Shares the store's expiry check with `get` but leaves the hit/miss
    /// counters alone.
    pub fn has(&self, namespace: impl AsRef<str>, key: &str) -> bool {
        self.inner
            .store
            .contains(&composite_key(namespace.as_ref(), key))
    }

    // == Delete ==
    /// Removes one entry. Deleting an absent key is a no-op.
    pub fn delete(&self, namespace: impl AsRef<str>, key: &str) {
        let composite = composite_key(namespace.as_ref(), key);
        let removed = self.inner.store.delete(&composite);
        self.inner.stats.lock().record_delete();
        trace!(key = %composite, removed, "Cache delete");
    }

    // == Clear Namespace ==
    /// Removes every entry of one namespace. Returns how many were removed.
    pub fn clear_namespace(&self, namespace: impl AsRef<str>) -> usize {
        let namespace = namespace.as_ref();
        let removed = self.inner.store.clear_by_prefix(&namespace_prefix(namespace));
        self.inner.stats.lock().record_clear();
        debug!(namespace, removed, "Cleared cache namespace");
        removed
    }

    // == Clear ==
    /// Removes every entry. Lifetime counters are kept.
    pub fn clear(&self) -> usize {
        let removed = self.inner.store.clear();
        self.inner.stats.lock().record_clear();
        debug!(removed, "Cleared cache");
        removed
    }

    // == Reset ==
    /// Returns the manager to its freshly constructed state: no entries, no
    /// in-flight registrations, zeroed counters and uptime.
    pub fn reset(&self) {
        self.inner.store.clear();
        self.inner.in_flight.clear();
        *self.inner.stats.lock() = CacheStats::new();
        *self.inner.started_at.lock() = Instant::now();
        debug!("Cache reset");
    }

    // == Purge Expired ==
    /// Drops entries whose TTL has elapsed. Used by the background sweeper.
    pub fn purge_expired(&self) -> usize {
        self.inner.store.purge_expired()
    }

    // == Get With Coalescing ==
    /// Runs `producer` for `composite_key` unless a fetch for that key is
    /// already outstanding, in which case its result is awaited instead.
    ///
    /// Every concurrent caller receives the same value or the same error. The
    /// registration is dropped once the fetch settles, so the next caller
    /// after a failure starts a fresh fetch.
    pub async fn get_with_coalescing<T, E, F, Fut>(
        &self,
        composite_key: &str,
        producer: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.inner.in_flight.run(composite_key, producer).await
    }

    // == Fetch Through ==
    /// Cache-first read used by the data-access services.
    ///
    /// On a hit the cached snapshot is returned. On a miss `fetch` runs once
    /// for all concurrent callers, its value is stored with `ttl_ms`, and
    /// errors are handed back without being cached. A `None` TTL means the
    /// read is not cached at all.
    pub async fn fetch_through<T, E, F, Fut>(
        &self,
        namespace: impl AsRef<str>,
        key: &str,
        ttl_ms: Option<u64>,
        fetch: F,
    ) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let namespace = namespace.as_ref().to_owned();

        let Some(ttl_ms) = ttl_ms else {
            trace!(namespace = %namespace, key, "No TTL configured, bypassing cache");
            return fetch().await.map(Arc::new);
        };

        if let Some(hit) = self.get::<T>(&namespace, key) {
            return Ok(hit);
        }

        let composite = composite_key(&namespace, key);
        let cache = self.clone();
        let key = key.to_owned();

        self.get_with_coalescing(&composite, move || async move {
            let value = Arc::new(fetch().await?);
            cache.set_shared(&namespace, &key, Arc::clone(&value), ttl_ms);
            Ok::<_, E>(value)
        })
        .await
    }

    // == Stats ==
    /// Read-only snapshot of counters and live entries.
    pub fn stats(&self) -> CacheStatsSnapshot {
        let counters = self.inner.stats.lock().clone();
        let uptime_ms = self.inner.started_at.lock().elapsed().as_millis() as u64;
        CacheStatsSnapshot::new(
            &counters,
            self.inner.store.entries(),
            self.inner.in_flight.len(),
            uptime_ms,
        )
    }

    /// Number of stored entries (including expired ones not yet dropped).
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(true)
    }
}

fn downcast<T: Send + Sync + 'static>(key: &str, value: CacheValue) -> Option<Arc<T>> {
    match value.downcast::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            if cfg!(debug_assertions) {
                panic!(
                    "cache entry `{key}` does not hold a `{}`",
                    type_name::<T>()
                );
            }
            error!(key, expected = type_name::<T>(), "Cache entry type mismatch");
            None
        }
    }
}
