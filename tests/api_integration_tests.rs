//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles, including how content reads populate
//! the cache and how writes invalidate it.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use content_cache::{
    api::create_router, document::MemoryDocumentStore, AppState, CacheManager, Namespace,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_state() -> (Arc<MemoryDocumentStore>, AppState) {
    let store = Arc::new(MemoryDocumentStore::new());
    let state = AppState::new(store.clone(), CacheManager::new(true));
    (store, state)
}

fn create_test_app() -> Router {
    create_router(create_test_state().1)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_post(app: &Router, title: &str, featured: bool) -> Value {
    let body = serde_json::json!({
        "title": title,
        "content": "body",
        "author_id": "u1",
        "status": "published",
        "featured": featured,
    })
    .to_string();
    let (status, json) = send(app, "POST", "/posts", Some(&body)).await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

// == Health ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Posts ==

#[tokio::test]
async fn test_create_then_get_post_by_slug() {
    let app = create_test_app();
    let created = create_post(&app, "Hello World", false).await;
    assert_eq!(created["slug"], "hello-world");

    let (status, json) = send(&app, "GET", "/posts/hello-world", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], created["id"]);
    assert_eq!(json["title"], "Hello World");
}

#[tokio::test]
async fn test_get_missing_post_returns_404() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/posts/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_create_post_validation_error() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        "POST",
        "/posts",
        Some(r#"{"title":"","content":"body","author_id":"u1"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_repeated_reads_are_served_from_cache() {
    let (store, state) = create_test_state();
    let app = create_router(state);
    create_post(&app, "Cached", false).await;

    let reads = store.reads();
    for _ in 0..5 {
        let (status, json) = send(&app, "GET", "/posts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);
    }
    assert_eq!(store.reads(), reads + 1);

    let (_, stats) = send(&app, "GET", "/cache/stats", None).await;
    assert_eq!(stats["hits"], 4);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["entries"][0]["key"], "POSTS:published");
}

#[tokio::test]
async fn test_update_is_visible_through_cache() {
    let app = create_test_app();
    let created = create_post(&app, "Original", false).await;
    let id = created["id"].as_str().unwrap();

    send(&app, "GET", "/posts/original", None).await;
    send(&app, "GET", "/posts", None).await;

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/posts/id/{id}"),
        Some(r#"{"title":"Edited"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Edited");

    let (_, json) = send(&app, "GET", "/posts/original", None).await;
    assert_eq!(json["title"], "Edited");
    let (_, json) = send(&app, "GET", "/posts", None).await;
    assert_eq!(json[0]["title"], "Edited");
}

#[tokio::test]
async fn test_update_missing_post_returns_404() {
    let app = create_test_app();

    let (status, _) = send(&app, "PUT", "/posts/id/missing", Some(r#"{"title":"x"}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_post() {
    let app = create_test_app();
    let created = create_post(&app, "Short lived", false).await;
    let id = created["id"].as_str().unwrap();
    send(&app, "GET", "/posts/short-lived", None).await;

    let (status, _) = send(&app, "DELETE", &format!("/posts/id/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/posts/short-lived", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/posts/id/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_outage_returns_503_and_is_not_cached() {
    let (store, state) = create_test_state();
    let app = create_router(state.clone());

    store.set_offline(true);
    let (status, json) = send(&app, "GET", "/posts", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().contains("unavailable"));
    assert!(state.cache.is_empty());

    store.set_offline(false);
    let (status, _) = send(&app, "GET", "/posts", None).await;
    assert_eq!(status, StatusCode::OK);
}

// == Engagement ==

#[tokio::test]
async fn test_likes_and_views_update_engagement() {
    let app = create_test_app();
    let created = create_post(&app, "Engaging", false).await;
    let id = created["id"].as_str().unwrap();
    let engagement_uri = format!("/posts/id/{id}/engagement");

    let (status, json) = send(&app, "GET", &engagement_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["likes"], 0);
    assert_eq!(json["views"], 0);

    let likes_uri = format!("/posts/id/{id}/likes");
    let (_, json) = send(&app, "POST", &likes_uri, Some(r#"{"user_id":"u2"}"#)).await;
    assert_eq!(json["recorded"], true);
    let (_, json) = send(&app, "POST", &likes_uri, Some(r#"{"user_id":"u2"}"#)).await;
    assert_eq!(json["recorded"], false);

    let views_uri = format!("/posts/id/{id}/views");
    send(&app, "POST", &views_uri, Some("{}")).await;
    send(&app, "POST", &views_uri, Some(r#"{"viewer_id":"u3"}"#)).await;

    let (_, json) = send(&app, "GET", &engagement_uri, None).await;
    assert_eq!(json["post_id"], id);
    assert_eq!(json["likes"], 1);
    assert_eq!(json["views"], 2);
    assert_eq!(json["shares"], 0);
    assert_eq!(json["comments"], 0);
}

// == Follows ==

#[tokio::test]
async fn test_follow_updates_counts() {
    let app = create_test_app();

    let (_, json) = send(&app, "GET", "/users/bob/follows", None).await;
    assert_eq!(json["followers"], 0);

    let (status, json) = send(
        &app,
        "POST",
        "/users/bob/follow",
        Some(r#"{"follower_id":"alice"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recorded"], true);

    let (_, json) = send(&app, "GET", "/users/bob/follows", None).await;
    assert_eq!(json["followers"], 1);
    assert_eq!(json["following"], 0);

    let (_, json) = send(&app, "GET", "/users/alice/follows", None).await;
    assert_eq!(json["following"], 1);
}

#[tokio::test]
async fn test_self_follow_rejected() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/users/bob/follow",
        Some(r#"{"follower_id":"bob"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == Cache diagnostics ==

#[tokio::test]
async fn test_clear_namespace_endpoint() {
    let (_, state) = create_test_state();
    let app = create_router(state.clone());
    state
        .cache
        .set(Namespace::Posts, "slug_hello-world", "Hello World".to_string(), 600_000);
    state.cache.set(Namespace::Users, "id_u1", "Ada".to_string(), 600_000);

    let (status, json) = send(&app, "DELETE", "/cache/POSTS", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);

    assert!(!state.cache.has(Namespace::Posts, "slug_hello-world"));
    assert!(state.cache.has(Namespace::Users, "id_u1"));
}

#[tokio::test]
async fn test_delete_entry_endpoint() {
    let (_, state) = create_test_state();
    let app = create_router(state.clone());
    state.cache.set(Namespace::Likes, "count_p1", 3u64, 60_000);

    let (status, json) = send(&app, "DELETE", "/cache/likes/count_p1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "LIKES:count_p1");
    assert!(state.cache.is_empty());
}

#[tokio::test]
async fn test_clear_all_keeps_counters() {
    let (_, state) = create_test_state();
    let app = create_router(state.clone());
    state.cache.set(Namespace::Views, "count_p1", 1u64, 60_000);
    state.cache.get::<u64>(Namespace::Views, "count_p1");

    let (_, json) = send(&app, "DELETE", "/cache", None).await;
    assert_eq!(json["removed"], 1);

    let (_, stats) = send(&app, "GET", "/cache/stats", None).await;
    assert_eq!(stats["total_entries"], 0);
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["clears"], 1);
}

#[tokio::test]
async fn test_invalidate_event_endpoint() {
    let (_, state) = create_test_state();
    let app = create_router(state.clone());
    state.cache.set(Namespace::Posts, "all", vec![1u8], 300_000);
    state.cache.set(Namespace::Posts, "featured", vec![1u8], 600_000);
    state.cache.set(Namespace::Users, "u1", vec![1u8], 900_000);

    let (status, json) = send(&app, "POST", "/cache/invalidate/POST_UPDATED", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["targets"], 2);

    assert!(!state.cache.has(Namespace::Posts, "all"));
    assert!(!state.cache.has(Namespace::Posts, "featured"));
    assert!(state.cache.has(Namespace::Users, "u1"));

    let (_, json) = send(&app, "POST", "/cache/invalidate/NOT_AN_EVENT", None).await;
    assert_eq!(json["targets"], 0);
}
