//! Cache Entry Module
//!
//! Defines a single stored value together with its insertion time, TTL and
//! the handle of its scheduled expiry task.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::{Duration, Instant};

/// Type-erased cached payload. Readers downcast it to the concrete type they stored.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
pub struct CacheEntry {
    /// The stored value
    pub value: CacheValue,
    /// Insertion instant (tokio clock, so tests can pause and advance it)
    pub inserted_at: Instant,
    /// Time to live in milliseconds, 0 = no expiration
    pub ttl_ms: u64,
    /// Write generation, used by expiry tasks to recognise their own entry
    pub(crate) generation: u64,
    /// Proactive expiry task, only present when `ttl_ms > 0`
    pub(crate) expiry_task: Option<AbortHandle>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current instant.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_ms` - TTL in milliseconds, `0` disables TTL expiry
    /// * `generation` - Store-wide write counter for this insertion
    pub fn new(value: CacheValue, ttl_ms: u64, generation: u64) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl_ms,
            generation,
            expiry_task: None,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at the given instant.
    ///
    /// Boundary condition: an entry stays valid while the elapsed time is less
    /// than or equal to its TTL, and becomes invalid strictly after it.
    /// Entries with a TTL of 0 never expire.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.ttl_ms != 0
            && now.saturating_duration_since(self.inserted_at) > Duration::from_millis(self.ttl_ms)
    }

    /// Checks if the entry has expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Age ==
    /// Milliseconds since the entry was written.
    pub fn age_ms(&self) -> u64 {
        Instant::now()
            .saturating_duration_since(self.inserted_at)
            .as_millis() as u64
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        if self.ttl_ms == 0 {
            return None;
        }
        Some(self.ttl_ms.saturating_sub(self.age_ms()))
    }

    /// Stops the scheduled expiry task, if any.
    pub(crate) fn cancel_expiry(&mut self) {
        if let Some(task) = self.expiry_task.take() {
            task.abort();
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("inserted_at", &self.inserted_at)
            .field("ttl_ms", &self.ttl_ms)
            .field("generation", &self.generation)
            .field("has_expiry_task", &self.expiry_task.is_some())
            .finish_non_exhaustive()
    }
}

// == Entry Snapshot ==
/// Diagnostic view of one live entry, as reported by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySnapshot {
    /// Composite key (`NAMESPACE:key`)
    pub key: String,
    /// Milliseconds since insertion
    pub age_ms: u64,
    /// Configured TTL, 0 = no expiration
    pub ttl_ms: u64,
    /// Time left before expiry, None for entries that never expire
    pub ttl_remaining_ms: Option<u64>,
}
