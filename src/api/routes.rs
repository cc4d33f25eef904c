//! API Routes
//!
//! Configures the Axum router with the cache diagnostics and content endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, clear_namespace_handler, create_post_handler, delete_entry_handler,
    delete_post_handler, engagement_handler, follow_counts_handler, follow_handler,
    get_post_handler, health_handler, invalidate_handler, like_handler, list_posts_handler,
    stats_handler, update_post_handler, view_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /cache/stats` - Cache counters and live entries
/// - `DELETE /cache` - Clear the whole cache
/// - `DELETE /cache/:namespace` - Clear one namespace
/// - `DELETE /cache/:namespace/:key` - Delete one entry
/// - `POST /cache/invalidate/:event` - Invalidate by write event
/// - `GET|POST /posts` - Published posts / create a post
/// - `GET /posts/:slug` - Post by slug
/// - `PUT|DELETE /posts/id/:id` - Update / delete a post
/// - `GET /posts/id/:id/engagement` - Like, view, share and comment counts
/// - `POST /posts/id/:id/likes` - Like a post
/// - `POST /posts/id/:id/views` - Record a view
/// - `GET /users/:id/follows` - Follower and following counts
/// - `POST /users/:id/follow` - Follow a user
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/invalidate/:event", post(invalidate_handler))
        .route("/cache/:namespace", delete(clear_namespace_handler))
        .route("/cache/:namespace/:key", delete(delete_entry_handler))
        .route("/posts", get(list_posts_handler).post(create_post_handler))
        .route("/posts/:slug", get(get_post_handler))
        .route(
            "/posts/id/:id",
            put(update_post_handler).delete(delete_post_handler),
        )
        .route("/posts/id/:id/engagement", get(engagement_handler))
        .route("/posts/id/:id/likes", post(like_handler))
        .route("/posts/id/:id/views", post(view_handler))
        .route("/users/:id/follows", get(follow_counts_handler))
        .route("/users/:id/follow", post(follow_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
