//! Response DTOs for the content cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::models::Engagement;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for cache clears (DELETE /cache, DELETE /cache/:namespace)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Entries removed by the clear
    pub removed: usize,
}

impl ClearResponse {
    pub fn all(removed: usize) -> Self {
        Self {
            message: "Cache cleared".to_string(),
            removed,
        }
    }

    pub fn namespace(namespace: &str, removed: usize) -> Self {
        Self {
            message: format!("Namespace '{}' cleared", namespace),
            removed,
        }
    }
}

/// Response body for single-entry deletes (DELETE /cache/:namespace/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted", key),
            key,
        }
    }
}

/// Response body for event invalidation (POST /cache/invalidate/:event)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub event: String,
    /// Cache targets dropped; 0 for events without a policy row
    pub targets: usize,
}

impl InvalidateResponse {
    pub fn new(event: impl Into<String>, targets: usize) -> Self {
        Self {
            event: event.into(),
            targets,
        }
    }
}

/// Engagement counters for one post (GET /posts/id/:id/engagement)
#[derive(Debug, Clone, Serialize)]
pub struct EngagementResponse {
    pub post_id: String,
    #[serde(flatten)]
    pub counts: Engagement,
}

impl EngagementResponse {
    pub fn new(post_id: impl Into<String>, counts: Engagement) -> Self {
        Self {
            post_id: post_id.into(),
            counts,
        }
    }
}

/// Follower and following counts for one user (GET /users/:id/follows)
#[derive(Debug, Clone, Serialize)]
pub struct FollowCountsResponse {
    pub user_id: String,
    pub followers: u64,
    pub following: u64,
}

/// Acknowledgement for engagement writes (likes, views, follows)
#[derive(Debug, Clone, Serialize)]
pub struct RecordedResponse {
    /// False when the write was a no-op (e.g. a repeated like)
    pub recorded: bool,
}
