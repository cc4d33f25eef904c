//! Post likes.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::{collection, ServiceContext};
use crate::cache::keys::{pair, scoped};
use crate::cache::policy::category;
use crate::cache::Namespace;
use crate::document::{decode_all, to_body, Document, DocumentStore, Query, StoreError};
use crate::error::Result;
use crate::models::Like;

#[derive(Clone)]
pub struct LikeService {
    context: ServiceContext,
}

impl LikeService {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    pub async fn count(&self, post_id: &str) -> Result<u64> {
        let query = Query::new().eq("post_id", post_id);
        let count = self
            .context
            .cached(
                Namespace::Likes,
                category::COUNT,
                &scoped(category::COUNT, post_id),
                move |store| async move {
                    Ok::<_, StoreError>(store.query(collection::LIKES, &query).await?.len() as u64)
                },
            )
            .await?;
        Ok(*count)
    }

    pub async fn has_liked(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let (post, user) = (post_id.to_string(), user_id.to_string());
        let liked = self
            .context
            .cached(
                Namespace::Likes,
                category::USER_LIKED,
                &pair(category::USER_LIKED, post_id, user_id),
                move |store| async move {
                    Ok::<_, StoreError>(!find(store.as_ref(), &post, &user).await?.is_empty())
                },
            )
            .await?;
        Ok(*liked)
    }

    /// Ids of the posts `user_id` has liked.
    pub async fn liked_by_user(&self, user_id: &str) -> Result<Arc<Vec<String>>> {
        let query = Query::new().eq("user_id", user_id);
        self.context
            .cached(
                Namespace::Likes,
                category::BY_USER,
                &scoped(category::BY_USER, user_id),
                move |store| async move {
                    let documents = store.query(collection::LIKES, &query).await?;
                    let likes = decode_all::<Like>(&documents)?;
                    Ok::<_, StoreError>(likes.into_iter().map(|like| like.post_id).collect())
                },
            )
            .await
    }

    /// Records a like. Returns false if the user already liked the post.
    pub async fn like(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let store = self.context.store();
        if !find(store, post_id, user_id).await?.is_empty() {
            return Ok(false);
        }

        let like = Like {
            id: String::new(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        store.create(collection::LIKES, to_body(&like)?).await?;

        self.context.invalidator().likes_changed(post_id, user_id);
        debug!(post_id, user_id, "Like recorded");
        Ok(true)
    }

    /// Removes a like. Returns false if there was none.
    pub async fn unlike(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let store = self.context.store();
        let existing = find(store, post_id, user_id).await?;
        let mut removed = false;
        for document in &existing {
            removed |= store.delete(collection::LIKES, &document.id).await?;
        }

        if removed {
            self.context.invalidator().likes_changed(post_id, user_id);
            debug!(post_id, user_id, "Like removed");
        }
        Ok(removed)
    }
}

async fn find(
    store: &dyn DocumentStore,
    post_id: &str,
    user_id: &str,
) -> std::result::Result<Vec<Document>, StoreError> {
    let query = Query::new().eq("post_id", post_id).eq("user_id", user_id);
    store.query(collection::LIKES, &query).await
}
