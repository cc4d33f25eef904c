//! Social graph: who follows whom.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::{collection, ServiceContext};
use crate::cache::keys::{pair, scoped};
use crate::cache::policy::category;
use crate::cache::Namespace;
use crate::document::{decode_all, to_body, Document, DocumentStore, Query, StoreError};
use crate::error::{AppError, Result};
use crate::models::Follow;

#[derive(Clone)]
pub struct FollowService {
    context: ServiceContext,
}

impl FollowService {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    /// Ids of the users following `user_id`.
    pub async fn followers(&self, user_id: &str) -> Result<Arc<Vec<String>>> {
        self.edges(category::FOLLOWERS, "following_id", user_id, |f| f.follower_id)
            .await
    }

    /// Ids of the users `user_id` follows.
    pub async fn following(&self, user_id: &str) -> Result<Arc<Vec<String>>> {
        self.edges(category::FOLLOWING, "follower_id", user_id, |f| f.following_id)
            .await
    }

    pub async fn follower_count(&self, user_id: &str) -> Result<u64> {
        self.count(category::FOLLOWER_COUNT, "following_id", user_id)
            .await
    }

    pub async fn following_count(&self, user_id: &str) -> Result<u64> {
        self.count(category::FOLLOWING_COUNT, "follower_id", user_id)
            .await
    }

    pub async fn is_following(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        let (follower, following) = (follower_id.to_string(), following_id.to_string());
        let follows = self
            .context
            .cached(
                Namespace::Follows,
                category::IS_FOLLOWING,
                &pair(category::IS_FOLLOWING, follower_id, following_id),
                move |store| async move {
                    let edges = find(store.as_ref(), &follower, &following).await?;
                    Ok::<_, StoreError>(!edges.is_empty())
                },
            )
            .await?;
        Ok(*follows)
    }

    /// Creates the edge. Returns false if it already existed.
    pub async fn follow(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        if follower_id == following_id {
            return Err(AppError::InvalidRequest(
                "Users cannot follow themselves".to_string(),
            ));
        }
        let store = self.context.store();
        if !find(store, follower_id, following_id).await?.is_empty() {
            return Ok(false);
        }

        let follow = Follow {
            id: String::new(),
            follower_id: follower_id.to_string(),
            following_id: following_id.to_string(),
            created_at: Utc::now(),
        };
        store.create(collection::FOLLOWS, to_body(&follow)?).await?;

        self.context
            .invalidator()
            .follow_changed(follower_id, following_id);
        debug!(follower_id, following_id, "Follow recorded");
        Ok(true)
    }

    /// Removes the edge. Returns false if there was none.
    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        let store = self.context.store();
        let mut removed = false;
        for document in find(store, follower_id, following_id).await? {
            removed |= store.delete(collection::FOLLOWS, &document.id).await?;
        }

        if removed {
            self.context
                .invalidator()
                .follow_changed(follower_id, following_id);
            debug!(follower_id, following_id, "Follow removed");
        }
        Ok(removed)
    }

    async fn edges(
        &self,
        category: &str,
        field: &'static str,
        user_id: &str,
        endpoint: fn(Follow) -> String,
    ) -> Result<Arc<Vec<String>>> {
        let query = Query::new().eq(field, user_id);
        self.context
            .cached(
                Namespace::Follows,
                category,
                &scoped(category, user_id),
                move |store| async move {
                    let documents = store.query(collection::FOLLOWS, &query).await?;
                    let follows = decode_all::<Follow>(&documents)?;
                    Ok::<_, StoreError>(follows.into_iter().map(endpoint).collect())
                },
            )
            .await
    }

    async fn count(&self, category: &str, field: &'static str, user_id: &str) -> Result<u64> {
        let query = Query::new().eq(field, user_id);
        let count = self
            .context
            .cached(
                Namespace::Follows,
                category,
                &scoped(category, user_id),
                move |store| async move {
                    Ok::<_, StoreError>(store.query(collection::FOLLOWS, &query).await?.len() as u64)
                },
            )
            .await?;
        Ok(*count)
    }
}

async fn find(
    store: &dyn DocumentStore,
    follower_id: &str,
    following_id: &str,
) -> std::result::Result<Vec<Document>, StoreError> {
    let query = Query::new()
        .eq("follower_id", follower_id)
        .eq("following_id", following_id);
    store.query(collection::FOLLOWS, &query).await
}
