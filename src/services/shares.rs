//! Post shares to external platforms.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::{collection, ServiceContext};
use crate::cache::keys::scoped;
use crate::cache::policy::category;
use crate::cache::Namespace;
use crate::document::{decode_all, to_body, Direction, Query, StoreError};
use crate::error::{AppError, Result};
use crate::models::Share;

#[derive(Clone)]
pub struct ShareService {
    context: ServiceContext,
}

impl ShareService {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    pub async fn count(&self, post_id: &str) -> Result<u64> {
        let query = Query::new().eq("post_id", post_id);
        let count = self
            .context
            .cached(
                Namespace::Shares,
                category::COUNT,
                &scoped(category::COUNT, post_id),
                move |store| async move {
                    Ok::<_, StoreError>(store.query(collection::SHARES, &query).await?.len() as u64)
                },
            )
            .await?;
        Ok(*count)
    }

    /// Shares of one post, newest first.
    pub async fn for_post(&self, post_id: &str) -> Result<Arc<Vec<Share>>> {
        let query = Query::new()
            .eq("post_id", post_id)
            .order_by("created_at", Direction::Descending);
        self.context
            .cached(
                Namespace::Shares,
                category::POST,
                &scoped(category::POST, post_id),
                move |store| async move {
                    let documents = store.query(collection::SHARES, &query).await?;
                    decode_all::<Share>(&documents)
                },
            )
            .await
    }

    pub async fn share(&self, post_id: &str, user_id: &str, platform: &str) -> Result<Share> {
        if platform.is_empty() {
            return Err(AppError::InvalidRequest(
                "Platform cannot be empty".to_string(),
            ));
        }
        let share = Share {
            id: String::new(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            platform: platform.to_string(),
            created_at: Utc::now(),
        };
        let document = self
            .context
            .store()
            .create(collection::SHARES, to_body(&share)?)
            .await?;

        self.context.invalidator().share_recorded(post_id);
        debug!(post_id, platform, "Share recorded");
        Ok(document.decode()?)
    }
}
