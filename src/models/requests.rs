//! Request DTOs
//!
//! Write payloads accepted by the services and the HTTP API.

use serde::{Deserialize, Serialize};

use crate::models::PostStatus;

/// Request body for creating a post (POST /posts)
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    /// Derived from the title when absent
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    pub author_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub featured: bool,
}

impl NewPost {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("Title cannot be empty".to_string());
        }
        if self.author_id.is_empty() {
            return Some("Author cannot be empty".to_string());
        }
        if let Some(slug) = &self.slug {
            if slug.is_empty() || slug.contains(':') {
                return Some(format!("Invalid slug '{slug}'"));
            }
        }
        None
    }
}

/// Partial post update (PUT /posts/id/:id); absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
}

impl NewUser {
    pub fn validate(&self) -> Option<String> {
        if self.username.is_empty() || self.username.contains(':') {
            return Some(format!("Invalid username '{}'", self.username));
        }
        if !self.email.contains('@') {
            return Some("Email must contain '@'".to_string());
        }
        None
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Request body for liking a post (POST /posts/id/:id/likes)
#[derive(Debug, Clone, Deserialize)]
pub struct LikeRequest {
    pub user_id: String,
}

/// Request body for recording a view (POST /posts/id/:id/views)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewRequest {
    #[serde(default)]
    pub viewer_id: Option<String>,
}

/// Request body for following a user (POST /users/:id/follow)
#[derive(Debug, Clone, Deserialize)]
pub struct FollowRequest {
    pub follower_id: String,
}
