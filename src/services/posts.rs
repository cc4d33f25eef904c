//! Post reads and writes.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::info;

use super::{collection, ServiceContext};
use crate::cache::keys::scoped;
use crate::cache::policy::category;
use crate::cache::{CacheEvent, Namespace};
use crate::document::{decode_all, to_body, Direction, DocumentStore, Query, StoreError};
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post, PostStatus, PostUpdate};

/// Posts shown on the featured strip.
pub const FEATURED_LIMIT: usize = 6;

#[derive(Clone)]
pub struct PostService {
    context: ServiceContext,
}

impl PostService {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    // == Reads ==

    /// Every post regardless of status, newest first.
    pub async fn list_all(&self) -> Result<Arc<Vec<Post>>> {
        self.list(category::ALL, category::ALL, Query::new()).await
    }

    pub async fn list_published(&self) -> Result<Arc<Vec<Post>>> {
        let query = Query::new().eq("status", PostStatus::Published.as_str());
        self.list(category::PUBLISHED, category::PUBLISHED, query).await
    }

    pub async fn featured(&self) -> Result<Arc<Vec<Post>>> {
        let query = Query::new()
            .eq("status", PostStatus::Published.as_str())
            .eq("featured", true)
            .limit(FEATURED_LIMIT);
        self.list(category::FEATURED, category::FEATURED, query).await
    }

    pub async fn by_category(&self, name: &str) -> Result<Arc<Vec<Post>>> {
        let query = Query::new()
            .eq("status", PostStatus::Published.as_str())
            .eq("category", name);
        self.list(category::CATEGORY, &scoped(category::CATEGORY, name), query)
            .await
    }

    /// Posts written by `author_id`, drafts included.
    pub async fn by_author(&self, author_id: &str) -> Result<Arc<Vec<Post>>> {
        let query = Query::new().eq("author_id", author_id);
        self.list(category::AUTHOR, &scoped(category::AUTHOR, author_id), query)
            .await
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Arc<Option<Post>>> {
        let owned = slug.to_string();
        self.context
            .cached(
                Namespace::Posts,
                category::SLUG,
                &scoped(category::SLUG, slug),
                move |store| async move { find_by_slug(store.as_ref(), &owned).await },
            )
            .await
    }

    pub async fn by_id(&self, id: &str) -> Result<Arc<Option<Post>>> {
        let owned = id.to_string();
        self.context
            .cached(
                Namespace::Posts,
                category::ID,
                &scoped(category::ID, id),
                move |store| async move {
                    store
                        .get(collection::POSTS, &owned)
                        .await?
                        .map(|doc| doc.decode::<Post>())
                        .transpose()
                },
            )
            .await
    }

    async fn list(&self, category: &str, key: &str, query: Query) -> Result<Arc<Vec<Post>>> {
        let query = query.order_by("created_at", Direction::Descending);
        self.context
            .cached(Namespace::Posts, category, key, move |store| async move {
                let documents = store.query(collection::POSTS, &query).await?;
                decode_all::<Post>(&documents)
            })
            .await
    }

    // == Writes ==

    /// Stores a new post. The slug defaults to the slugified title and must be
    /// unique.
    pub async fn create(&self, request: NewPost) -> Result<Post> {
        if let Some(message) = request.validate() {
            return Err(AppError::InvalidRequest(message));
        }
        let slug = match &request.slug {
            Some(slug) => slug.clone(),
            None => slug::slugify(&request.title),
        };
        if slug.is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "Cannot derive a slug from '{}'",
                request.title
            )));
        }

        let store = self.context.store();
        if find_by_slug(store, &slug).await?.is_some() {
            return Err(AppError::InvalidRequest(format!(
                "Slug '{}' is already in use",
                slug
            )));
        }

        let now = Utc::now();
        let post = Post {
            id: String::new(),
            title: request.title,
            slug,
            content: request.content,
            excerpt: request.excerpt,
            author_id: request.author_id,
            category: request.category,
            tags: request.tags,
            status: request.status,
            featured: request.featured,
            created_at: now,
            updated_at: now,
        };
        let document = store.create(collection::POSTS, to_body(&post)?).await?;
        let post: Post = document.decode()?;

        self.invalidate(&post, CacheEvent::PostCreated);
        info!(id = %post.id, slug = %post.slug, "Post created");
        Ok(post)
    }

    pub async fn update(&self, id: &str, update: PostUpdate) -> Result<Post> {
        let mut patch = to_body(&update)?;
        patch.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
        let document = self
            .context
            .store()
            .update(collection::POSTS, id, patch)
            .await?;
        let post: Post = document.decode()?;

        self.invalidate(&post, CacheEvent::PostUpdated);
        info!(id = %post.id, "Post updated");
        Ok(post)
    }

    /// Removes a post. Returns false if it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let store = self.context.store();
        let Some(document) = store.get(collection::POSTS, id).await? else {
            return Ok(false);
        };
        let post: Post = document.decode()?;
        if !store.delete(collection::POSTS, id).await? {
            return Ok(false);
        }

        self.invalidate(&post, CacheEvent::PostDeleted);
        info!(id = %post.id, "Post deleted");
        Ok(true)
    }

    fn invalidate(&self, post: &Post, event: CacheEvent) {
        let invalidator = self.context.invalidator();
        invalidator.post_changed(&post.id, Some(&post.slug));
        invalidator.invalidate_by_event(event);
    }
}

async fn find_by_slug(
    store: &dyn DocumentStore,
    slug: &str,
) -> std::result::Result<Option<Post>, StoreError> {
    let documents = store
        .query(collection::POSTS, &Query::new().eq("slug", slug).limit(1))
        .await?;
    documents.first().map(|doc| doc.decode::<Post>()).transpose()
}
