//! Content Cache - read-through caching for a content platform
//!
//! Namespaced, TTL-based in-memory cache in front of a per-read-billed
//! document store, with request coalescing, event-driven invalidation and
//! the data-access services for posts, users and engagement.

pub mod api;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod models;
pub mod seed;
pub mod services;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, Invalidator, Namespace};
pub use config::Config;
pub use services::Services;
pub use tasks::spawn_cleanup_task;
