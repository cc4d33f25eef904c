//! Data-access services
//!
//! One service per entity. Reads go cache-first through
//! [`CacheManager::fetch_through`] with the TTL the policy assigns to the
//! read's category; writes go to the document store first and invalidate
//! afterwards, so a failed write never drops cache entries.

pub mod comments;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod shares;
pub mod users;
pub mod views;

use std::future::Future;
use std::sync::Arc;

use tracing::trace;

use crate::cache::{policy, CacheManager, Invalidator, Namespace};
use crate::document::{DocumentStore, StoreError};
use crate::error::Result;
use crate::models::Engagement;

pub use comments::CommentService;
pub use follows::FollowService;
pub use likes::LikeService;
pub use posts::PostService;
pub use shares::ShareService;
pub use users::UserService;
pub use views::ViewService;

/// Document-store collection names.
pub mod collection {
    pub const POSTS: &str = "posts";
    pub const USERS: &str = "users";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const VIEWS: &str = "views";
    pub const FOLLOWS: &str = "follows";
    pub const SHARES: &str = "shares";
}

// == Service Context ==
/// Handles every service holds: the store, the shared cache and the
/// invalidation helper built on it.
#[derive(Clone)]
pub struct ServiceContext {
    store: Arc<dyn DocumentStore>,
    cache: CacheManager,
    invalidator: Invalidator,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn DocumentStore>, cache: CacheManager) -> Self {
        let invalidator = Invalidator::new(cache.clone());
        Self {
            store,
            cache,
            invalidator,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    /// Cache-first read of `namespace:key`, cached for the TTL the policy
    /// gives `category`. `fetch` receives its own store handle so it can
    /// outlive the caller when the fetch is shared.
    pub(crate) async fn cached<T, F, Fut>(
        &self,
        namespace: Namespace,
        category: &str,
        key: &str,
        fetch: F,
    ) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Arc<dyn DocumentStore>) -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, StoreError>> + Send + 'static,
    {
        let ttl_ms = policy::ttl_ms(namespace, category);
        trace!(namespace = %namespace, key, ?ttl_ms, "Service read");
        let store = Arc::clone(&self.store);
        let value = self
            .cache
            .fetch_through(namespace, key, ttl_ms, move || fetch(store))
            .await?;
        Ok(value)
    }
}

// == Services ==
/// All data-access services wired to one store and one cache.
#[derive(Clone)]
pub struct Services {
    pub posts: PostService,
    pub users: UserService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub views: ViewService,
    pub follows: FollowService,
    pub shares: ShareService,
}

impl Services {
    pub fn new(store: Arc<dyn DocumentStore>, cache: CacheManager) -> Self {
        let context = ServiceContext::new(store, cache);
        Self {
            posts: PostService::new(context.clone()),
            users: UserService::new(context.clone()),
            comments: CommentService::new(context.clone()),
            likes: LikeService::new(context.clone()),
            views: ViewService::new(context.clone()),
            follows: FollowService::new(context.clone()),
            shares: ShareService::new(context),
        }
    }

    /// Like, view, share and comment counts for one post, read concurrently.
    pub async fn engagement(&self, post_id: &str) -> Result<Engagement> {
        let (likes, views, shares, comments) = tokio::try_join!(
            self.likes.count(post_id),
            self.views.count(post_id),
            self.shares.count(post_id),
            self.comments.count(post_id),
        )?;
        Ok(Engagement {
            likes,
            views,
            shares,
            comments,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocumentStore;

    #[tokio::test]
    async fn test_engagement_counts() {
        let store = Arc::new(MemoryDocumentStore::new());
        let services = Services::new(store.clone(), CacheManager::default());

        services.likes.like("p1", "u1").await.unwrap();
        services.likes.like("p1", "u2").await.unwrap();
        services.views.record("p1", None).await.unwrap();
        services.shares.share("p1", "u1", "mastodon").await.unwrap();

        let engagement = services.engagement("p1").await.unwrap();
        assert_eq!(
            engagement,
            Engagement {
                likes: 2,
                views: 1,
                shares: 1,
                comments: 0,
            }
        );

        let reads = store.reads();
        services.engagement("p1").await.unwrap();
        assert_eq!(store.reads(), reads);
    }

    #[tokio::test]
    async fn test_uncached_category_always_reads_store() {
        let (store, context) = test_support::context();
        for _ in 0..3 {
            let value: Arc<u64> = context
                .cached(Namespace::Posts, "unlisted", "unlisted_x", |_| async {
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(*value, 7);
        }
        assert!(context.cache().is_empty());
        assert_eq!(store.reads(), 0);
    }
}
