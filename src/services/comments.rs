//! Comment threads.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{collection, ServiceContext};
use crate::cache::keys::scoped;
use crate::cache::policy::category;
use crate::cache::{CacheEvent, Namespace};
use crate::document::{decode_all, to_body, Direction, Query, StoreError};
use crate::error::{AppError, Result};
use crate::models::Comment;

/// Comments shown in the site-wide "recent" feed.
pub const RECENT_LIMIT: usize = 10;

#[derive(Clone)]
pub struct CommentService {
    context: ServiceContext,
}

impl CommentService {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    /// Comments on one post, oldest first.
    pub async fn for_post(&self, post_id: &str) -> Result<Arc<Vec<Comment>>> {
        let query = Query::new()
            .eq("post_id", post_id)
            .order_by("created_at", Direction::Ascending);
        self.context
            .cached(
                Namespace::Comments,
                category::POST,
                &scoped(category::POST, post_id),
                move |store| async move {
                    let documents = store.query(collection::COMMENTS, &query).await?;
                    decode_all::<Comment>(&documents)
                },
            )
            .await
    }

    pub async fn count(&self, post_id: &str) -> Result<u64> {
        let query = Query::new().eq("post_id", post_id);
        let count = self
            .context
            .cached(
                Namespace::Comments,
                category::COUNT,
                &scoped(category::COUNT, post_id),
                move |store| async move {
                    Ok::<_, StoreError>(store.query(collection::COMMENTS, &query).await?.len() as u64)
                },
            )
            .await?;
        Ok(*count)
    }

    /// Newest comments across all posts.
    pub async fn recent(&self) -> Result<Arc<Vec<Comment>>> {
        self.context
            .cached(
                Namespace::Comments,
                category::RECENT,
                category::RECENT,
                |store| async move {
                    let query = Query::new()
                        .order_by("created_at", Direction::Descending)
                        .limit(RECENT_LIMIT);
                    let documents = store.query(collection::COMMENTS, &query).await?;
                    decode_all::<Comment>(&documents)
                },
            )
            .await
    }

    pub async fn add(&self, post_id: &str, author_id: &str, body: &str) -> Result<Comment> {
        if body.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "Comment cannot be empty".to_string(),
            ));
        }
        let comment = Comment {
            id: String::new(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };
        let document = self
            .context
            .store()
            .create(collection::COMMENTS, to_body(&comment)?)
            .await?;
        let comment: Comment = document.decode()?;

        self.invalidate(&comment.post_id, CacheEvent::CommentAdded);
        info!(id = %comment.id, post_id, "Comment added");
        Ok(comment)
    }

    /// Removes a comment. Returns false if it did not exist.
    pub async fn delete(&self, comment_id: &str) -> Result<bool> {
        let store = self.context.store();
        let Some(document) = store.get(collection::COMMENTS, comment_id).await? else {
            return Ok(false);
        };
        let comment: Comment = document.decode()?;
        if !store.delete(collection::COMMENTS, comment_id).await? {
            return Ok(false);
        }

        self.invalidate(&comment.post_id, CacheEvent::CommentDeleted);
        info!(id = comment_id, post_id = %comment.post_id, "Comment deleted");
        Ok(true)
    }

    fn invalidate(&self, post_id: &str, event: CacheEvent) {
        let invalidator = self.context.invalidator();
        invalidator.comments_changed(post_id);
        invalidator.invalidate_by_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::context;

    #[tokio::test]
    async fn test_add_refreshes_thread_and_count() {
        let (store, context) = context();
        let comments = CommentService::new(context);

        assert_eq!(comments.count("p1").await.unwrap(), 0);
        assert!(comments.for_post("p1").await.unwrap().is_empty());

        let reads = store.reads();
        assert_eq!(comments.count("p1").await.unwrap(), 0);
        assert_eq!(store.reads(), reads);

        comments.add("p1", "u1", "First!").await.unwrap();
        comments.add("p1", "u2", "Second").await.unwrap();

        assert_eq!(comments.count("p1").await.unwrap(), 2);
        let thread = comments.for_post("p1").await.unwrap();
        let bodies: Vec<&str> = thread.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies.len(), 2);
        assert!(bodies.contains(&"First!"));
    }

    #[tokio::test]
    async fn test_recent_feed_sees_new_comments() {
        let (_, context) = context();
        let comments = CommentService::new(context);

        assert!(comments.recent().await.unwrap().is_empty());
        comments.add("p2", "u1", "Nice post").await.unwrap();
        assert_eq!(comments.recent().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let (_, context) = context();
        let comments = CommentService::new(context);
        let comment = comments.add("p1", "u1", "oops").await.unwrap();

        assert_eq!(comments.count("p1").await.unwrap(), 1);
        assert!(comments.delete(&comment.id).await.unwrap());
        assert_eq!(comments.count("p1").await.unwrap(), 0);
        assert!(!comments.delete(&comment.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_comment_rejected() {
        let (store, context) = context();
        let comments = CommentService::new(context);

        let err = comments.add("p1", "u1", "   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(store.writes(), 0);
    }
}
