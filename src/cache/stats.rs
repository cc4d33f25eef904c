//! Cache Statistics Module
//!
//! Lifetime counters for cache traffic and the read-only snapshot served to
//! the diagnostic panel.

use serde::Serialize;

use crate::cache::EntrySnapshot;

// == Cache Stats ==
/// Cumulative cache counters. Clearing the cache leaves them untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of `get` calls that returned a value
    pub hits: u64,
    /// Number of `get` calls that returned nothing (absent or expired)
    pub misses: u64,
    /// Number of `set` calls
    pub sets: u64,
    /// Number of `delete` calls
    pub deletes: u64,
    /// Number of namespace or full clears
    pub clears: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Ratio ==
    /// Calculates the cache hit ratio.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_clear(&mut self) {
        self.clears += 1;
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the cache for operational visibility.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    pub hit_ratio: f64,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub clears: u64,
    /// Live (unexpired) entries
    pub total_entries: usize,
    /// Fetches currently registered for coalescing
    pub in_flight: usize,
    /// Milliseconds since the manager was created or last reset
    pub uptime_ms: u64,
    pub entries: Vec<EntrySnapshot>,
}

impl CacheStatsSnapshot {
    /// Assembles a snapshot from counters and the live entry listing.
    pub fn new(
        stats: &CacheStats,
        entries: Vec<EntrySnapshot>,
        in_flight: usize,
        uptime_ms: u64,
    ) -> Self {
        Self {
            hit_ratio: stats.hit_ratio(),
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            deletes: stats.deletes,
            clears: stats.clears,
            total_entries: entries.len(),
            in_flight,
            uptime_ms,
            entries,
        }
    }
}
