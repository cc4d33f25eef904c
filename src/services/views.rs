//! Post view tracking.

use chrono::Utc;
use tracing::trace;

use super::{collection, ServiceContext};
use crate::cache::keys::scoped;
use crate::cache::policy::category;
use crate::cache::Namespace;
use crate::document::{to_body, Query, StoreError};
use crate::error::Result;
use crate::models::View;

#[derive(Clone)]
pub struct ViewService {
    context: ServiceContext,
}

impl ViewService {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    pub async fn count(&self, post_id: &str) -> Result<u64> {
        let query = Query::new().eq("post_id", post_id);
        let count = self
            .context
            .cached(
                Namespace::Views,
                category::COUNT,
                &scoped(category::COUNT, post_id),
                move |store| async move {
                    Ok::<_, StoreError>(store.query(collection::VIEWS, &query).await?.len() as u64)
                },
            )
            .await?;
        Ok(*count)
    }

    /// Records one view; anonymous when `viewer_id` is `None`.
    pub async fn record(&self, post_id: &str, viewer_id: Option<&str>) -> Result<View> {
        let view = View {
            id: String::new(),
            post_id: post_id.to_string(),
            viewer_id: viewer_id.map(str::to_string),
            created_at: Utc::now(),
        };
        let document = self
            .context
            .store()
            .create(collection::VIEWS, to_body(&view)?)
            .await?;

        self.context.invalidator().view_recorded(post_id);
        trace!(post_id, "View recorded");
        Ok(document.decode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::context;

    #[tokio::test]
    async fn test_record_bumps_count() {
        let (store, context) = context();
        let views = ViewService::new(context);

        assert_eq!(views.count("p1").await.unwrap(), 0);
        views.record("p1", Some("u1")).await.unwrap();
        views.record("p1", None).await.unwrap();
        assert_eq!(views.count("p1").await.unwrap(), 2);

        let reads = store.reads();
        assert_eq!(views.count("p1").await.unwrap(), 2);
        assert_eq!(store.reads(), reads);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() {
        let (store, context) = context();
        let views = ViewService::new(context.clone());
        views.count("p1").await.unwrap();

        store.set_offline(true);
        assert!(views.record("p1", None).await.is_err());
        assert!(context
            .cache()
            .has(Namespace::Views, &scoped(category::COUNT, "p1")));
    }
}
