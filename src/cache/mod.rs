//! Cache Module
//!
//! Namespaced, TTL-based read-through cache shared by the data-access
//! services: a store with per-entry expiry tasks, a manager adding
//! namespaces, typed access, coalescing and statistics, the policy tables
//! and the invalidation helper.

mod coalesce;
mod entry;
pub mod invalidation;
pub mod keys;
mod manager;
pub mod policy;
mod stats;
mod store;


// Re-export public types
pub use coalesce::InFlightRegistry;
pub use entry::{CacheEntry, CacheValue, EntrySnapshot};
pub use invalidation::Invalidator;
pub use keys::Namespace;
pub use manager::CacheManager;
pub use policy::CacheEvent;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::CacheStore;
