//! API Handlers
//!
//! HTTP request handlers for the cache diagnostics and the content endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::{CacheManager, CacheStatsSnapshot, Invalidator, Namespace};
use crate::config::Config;
use crate::document::{DocumentStore, MemoryDocumentStore};
use crate::error::{AppError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, EngagementResponse, FollowCountsResponse, FollowRequest,
    HealthResponse, InvalidateResponse, LikeRequest, NewPost, Post, PostUpdate,
    RecordedResponse, ViewRequest,
};
use crate::services::Services;

/// Application state shared across all handlers.
///
/// Every field is a cheap handle onto the same cache.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheManager,
    pub invalidator: Invalidator,
    pub services: Services,
}

impl AppState {
    /// Creates a new AppState over the given document store and cache.
    pub fn new(store: Arc<dyn DocumentStore>, cache: CacheManager) -> Self {
        Self {
            invalidator: Invalidator::new(cache.clone()),
            services: Services::new(store, cache.clone()),
            cache,
        }
    }

    /// Creates a new AppState from configuration, backed by an in-memory
    /// document store.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheManager::new(config.proactive_expiry);
        Self::new(Arc::new(MemoryDocumentStore::new()), cache)
    }
}

fn parse_namespace(name: &str) -> Result<Namespace> {
    Namespace::parse(name)
        .ok_or_else(|| AppError::InvalidRequest(format!("Unknown namespace '{}'", name)))
}

// == Cache diagnostics ==

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /cache/stats
///
/// Counters, hit ratio and the live entry listing.
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStatsSnapshot> {
    Json(state.cache.stats())
}

/// Handler for DELETE /cache
///
/// Drops every entry; lifetime counters are kept.
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.cache.clear();
    info!(removed, "Cache cleared via API");
    Json(ClearResponse::all(removed))
}

/// Handler for DELETE /cache/:namespace
pub async fn clear_namespace_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<ClearResponse>> {
    let namespace = parse_namespace(&namespace)?;
    let removed = state.cache.clear_namespace(namespace);
    Ok(Json(ClearResponse::namespace(namespace.as_str(), removed)))
}

/// Handler for DELETE /cache/:namespace/:key
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let namespace = parse_namespace(&namespace)?;
    state.cache.delete(namespace, &key);
    Ok(Json(DeleteResponse::new(CacheManager::generate_key(
        namespace.as_str(),
        &key,
    ))))
}

/// Handler for POST /cache/invalidate/:event
///
/// Unknown events are accepted and invalidate nothing.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> Json<InvalidateResponse> {
    let targets = state.invalidator.invalidate_by_event(&event);
    Json(InvalidateResponse::new(event, targets))
}

// == Posts ==

/// Handler for GET /posts
///
/// Published posts, newest first.
pub async fn list_posts_handler(State(state): State<AppState>) -> Result<Json<Vec<Post>>> {
    let posts = state.services.posts.list_published().await?;
    Ok(Json(posts.as_ref().clone()))
}

/// Handler for POST /posts
pub async fn create_post_handler(
    State(state): State<AppState>,
    Json(req): Json<NewPost>,
) -> Result<(StatusCode, Json<Post>)> {
    let post = state.services.posts.create(req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Handler for GET /posts/:slug
pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>> {
    match state.services.posts.by_slug(&slug).await?.as_ref() {
        Some(post) => Ok(Json(post.clone())),
        None => Err(AppError::NotFound(format!("Post '{}'", slug))),
    }
}

/// Handler for PUT /posts/id/:id
pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<PostUpdate>,
) -> Result<Json<Post>> {
    let post = state.services.posts.update(&id, update).await?;
    Ok(Json(post))
}

/// Handler for DELETE /posts/id/:id
pub async fn delete_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.services.posts.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Post '{}'", id)))
    }
}

// == Engagement ==

/// Handler for GET /posts/id/:id/engagement
pub async fn engagement_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EngagementResponse>> {
    let counts = state.services.engagement(&id).await?;
    Ok(Json(EngagementResponse::new(id, counts)))
}

/// Handler for POST /posts/id/:id/likes
pub async fn like_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<RecordedResponse>> {
    let recorded = state.services.likes.like(&id, &req.user_id).await?;
    Ok(Json(RecordedResponse { recorded }))
}

/// Handler for POST /posts/id/:id/views
pub async fn view_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ViewRequest>,
) -> Result<Json<RecordedResponse>> {
    state
        .services
        .views
        .record(&id, req.viewer_id.as_deref())
        .await?;
    Ok(Json(RecordedResponse { recorded: true }))
}

// == Follows ==

/// Handler for GET /users/:id/follows
pub async fn follow_counts_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FollowCountsResponse>> {
    let follows = &state.services.follows;
    let (followers, following) =
        tokio::try_join!(follows.follower_count(&id), follows.following_count(&id))?;
    Ok(Json(FollowCountsResponse {
        user_id: id,
        followers,
        following,
    }))
}

/// Handler for POST /users/:id/follow
///
/// `follower_id` in the body starts following the user in the path.
pub async fn follow_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<RecordedResponse>> {
    let recorded = state.services.follows.follow(&req.follower_id, &id).await?;
    Ok(Json(RecordedResponse { recorded }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostStatus;

    fn test_state() -> AppState {
        AppState::from_config(&Config::default())
    }

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            slug: None,
            content: "body".to_string(),
            excerpt: String::new(),
            author_id: "u1".to_string(),
            category: None,
            tags: Vec::new(),
            status: PostStatus::Published,
            featured: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let state = test_state();

        let (status, created) = create_post_handler(State(state.clone()), Json(new_post("Hello World")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.slug, "hello-world");

        let fetched = get_post_handler(State(state.clone()), Path("hello-world".to_string()))
            .await
            .unwrap();
        assert_eq!(fetched.id, created.id);

        let listed = list_posts_handler(State(state)).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_post() {
        let state = test_state();

        let result = get_post_handler(State(state), Path("nope".to_string())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_post_handler() {
        let state = test_state();
        let (_, post) = create_post_handler(State(state.clone()), Json(new_post("Bye")))
            .await
            .unwrap();

        let status = delete_post_handler(State(state.clone()), Path(post.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let result = delete_post_handler(State(state), Path(post.id.clone())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.hit_ratio, 0.0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_clear_namespace_handler() {
        let state = test_state();
        state.cache.set(Namespace::Posts, "all", 1u8, 60_000);
        state.cache.set(Namespace::Users, "all", 1u8, 60_000);

        let response = clear_namespace_handler(State(state.clone()), Path("posts".to_string()))
            .await
            .unwrap();
        assert_eq!(response.removed, 1);
        assert!(state.cache.has(Namespace::Users, "all"));

        let result = clear_namespace_handler(State(state), Path("bogus".to_string())).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalidate_handler() {
        let state = test_state();
        state.cache.set(Namespace::Posts, "all", 1u8, 60_000);
        state.cache.set(Namespace::Posts, "featured", 1u8, 60_000);

        let response = invalidate_handler(State(state.clone()), Path("POST_UPDATED".to_string())).await;
        assert_eq!(response.targets, 2);
        assert!(state.cache.is_empty());

        let response = invalidate_handler(State(state), Path("SOMETHING_ELSE".to_string())).await;
        assert_eq!(response.targets, 0);
    }

    #[tokio::test]
    async fn test_follow_handlers() {
        let state = test_state();

        let response = follow_handler(
            State(state.clone()),
            Path("bob".to_string()),
            Json(FollowRequest {
                follower_id: "alice".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(response.recorded);

        let counts = follow_counts_handler(State(state), Path("bob".to_string()))
            .await
            .unwrap();
        assert_eq!(counts.followers, 1);
        assert_eq!(counts.following, 0);
    }
}
