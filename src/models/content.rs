//! Domain records stored in the document store.
//!
//! Each record decodes from a [`Document`](crate::document::Document) with its
//! id injected. Timestamps are stored as RFC 3339 UTC strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub author_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: PostStatus,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub post_id: String,
    #[serde(default)]
    pub viewer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregated engagement counters for one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Engagement {
    pub likes: u64,
    pub views: u64,
    pub shares: u64,
    pub comments: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_deserialize_defaults() {
        let post: Post = serde_json::from_value(json!({
            "id": "p1",
            "title": "Hello",
            "slug": "hello",
            "content": "body",
            "author_id": "u1",
            "status": "published",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(post.status, PostStatus::Published);
        assert!(post.tags.is_empty());
        assert!(!post.featured);
        assert_eq!(post.category, None);
    }

    #[test]
    fn test_status_round_trips_lowercase() {
        assert_eq!(serde_json::to_value(PostStatus::Draft).unwrap(), "draft");
        assert_eq!(PostStatus::Published.as_str(), "published");
    }
}
