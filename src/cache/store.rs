//! Cache Store Module
//!
//! Process-local map from composite key to entry, with one cancellable expiry
//! task per TTL'd entry. The store knows nothing about namespaces; the manager
//! layers them on top through key construction.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::cache::{CacheEntry, CacheValue, EntrySnapshot};

#[derive(Debug, Default)]
struct StoreInner {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Monotonic write counter
    generation: u64,
}

// == Cache Store ==
/// In-memory entry storage with lazy and proactive TTL expiry.
///
/// Cloning is cheap and shares the same underlying map.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<Mutex<StoreInner>>,
    /// Whether `set` schedules a per-entry expiry task
    proactive_expiry: bool,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `proactive_expiry` - schedule a deletion task for every entry with a
    ///   TTL; when false, expired entries are only dropped on read or sweep
    pub fn new(proactive_expiry: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner::default())),
            proactive_expiry,
        }
    }

    // == Set ==
    /// Stores a value, replacing any previous entry for the key.
    ///
    /// The replaced entry's expiry task is aborted, and a fresh one is
    /// scheduled when `ttl_ms > 0`. A TTL of 0 means the entry never expires.
    pub fn set(&self, key: impl Into<String>, value: CacheValue, ttl_ms: u64) {
        let key = key.into();
        let mut inner = self.inner.lock();

        inner.generation += 1;
        let generation = inner.generation;

        let mut entry = CacheEntry::new(value, ttl_ms, generation);
        if ttl_ms > 0 && self.proactive_expiry {
            entry.expiry_task = self.schedule_expiry(key.clone(), generation, ttl_ms);
        }

        if let Some(mut previous) = inner.entries.insert(key, entry) {
            previous.cancel_expiry();
        }
    }

    // == Get ==
    /// Retrieves a value if present and still valid.
    ///
    /// An expired entry is removed as a side effect and reported as absent,
    /// whether or not its expiry task has fired yet.
    pub fn get(&self, key: &str) -> Option<CacheValue> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => return None,
        };

        if expired {
            if let Some(mut stale) = inner.entries.remove(key) {
                stale.cancel_expiry();
            }
            trace!(key, "Lazily expired cache entry");
            return None;
        }

        inner.entries.get(key).map(|entry| Arc::clone(&entry.value))
    }

    // == Contains ==
    /// True iff `get` would return a value right now.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Delete ==
    /// Removes an entry and cancels its expiry task.
    ///
    /// Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        match self.inner.lock().entries.remove(key) {
            Some(mut entry) => {
                entry.cancel_expiry();
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry. Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        for (_, mut entry) in inner.entries.drain() {
            entry.cancel_expiry();
        }
        count
    }

    // == Clear By Prefix ==
    /// Removes every entry whose key starts with `prefix`. Returns the number removed.
    pub fn clear_by_prefix(&self, prefix: &str) -> usize {
        self.remove_where(|key, _| key.starts_with(prefix))
    }

    // == Purge Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        self.remove_where(|_, entry| entry.is_expired_at(now))
    }

    // == Length ==
    /// Returns the current number of stored entries, including expired ones
    /// that have not been read or swept yet.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    // == Entries ==
    /// Diagnostic listing of `(key, age, ttl, remaining)` for every valid entry, sorted by key.
    pub fn entries(&self) -> Vec<EntrySnapshot> {
        let inner = self.inner.lock();
        let now = Instant::now();

        let mut snapshot: Vec<EntrySnapshot> = inner
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| EntrySnapshot {
                key: key.clone(),
                age_ms: entry.age_ms(),
                ttl_ms: entry.ttl_ms,
                ttl_remaining_ms: entry.ttl_remaining_ms(),
            })
            .collect();
        snapshot.sort_by(|a, b| a.key.cmp(&b.key));
        snapshot
    }

    fn remove_where(&self, mut predicate: impl FnMut(&str, &CacheEntry) -> bool) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, entry| {
            if predicate(key, entry) {
                entry.cancel_expiry();
                false
            } else {
                true
            }
        });
        before - inner.entries.len()
    }

    /// Spawns the proactive expiry task for one write.
    ///
    /// Returns `None` outside a tokio runtime; lazy expiry and the sweeper
    /// still cover those entries.
    fn schedule_expiry(&self, key: String, generation: u64, ttl_ms: u64) -> Option<AbortHandle> {
        let runtime = Handle::try_current().ok()?;
        let store: Weak<Mutex<StoreInner>> = Arc::downgrade(&self.inner);

        let task = runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(ttl_ms)).await;

            let Some(store) = store.upgrade() else {
                return;
            };
            let mut inner = store.lock();
            // A newer write for the same key owns the slot now
            if inner
                .entries
                .get(&key)
                .is_some_and(|entry| entry.generation == generation)
            {
                inner.entries.remove(&key);
                debug!(key = %key, ttl_ms, "Expired cache entry");
            }
        });

        Some(task.abort_handle())
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(true)
    }
}
