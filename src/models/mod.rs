//! Domain records and request/response models
//!
//! Records are what the document store holds; the DTOs are what the HTTP
//! API and the services accept and return.

pub mod content;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use content::{Comment, Engagement, Follow, Like, Post, PostStatus, Share, User, View};
pub use requests::{
    FollowRequest, LikeRequest, NewPost, NewUser, PostUpdate, UserUpdate, ViewRequest,
};
pub use responses::{
    ClearResponse, DeleteResponse, EngagementResponse, FollowCountsResponse, HealthResponse,
    InvalidateResponse, RecordedResponse,
};
