//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle: read path with cache backfill,
//! feed publishing through ingestion, and the auxiliary endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use order_service::{
    api::create_router,
    cache::LruCache,
    models::Order,
    spawn_ingest_task,
    storage::{MemoryOrderStorage, OrderStorage},
    AppState,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

const UID: &str = "b563feb7b2b84b6test";

// == Helper Functions ==

struct TestApp {
    router: Router,
    cache: Arc<LruCache<Order>>,
    storage: Arc<MemoryOrderStorage>,
}

fn create_test_app(capacity: usize) -> TestApp {
    let storage = Arc::new(MemoryOrderStorage::new());
    let cache = Arc::new(LruCache::new(capacity));
    let (tx, rx) = mpsc::channel(16);
    spawn_ingest_task(rx, storage.clone());

    let state = AppState::new(cache.clone(), storage.clone(), tx);
    TestApp {
        router: create_router(state, Duration::from_secs(5)),
        cache,
        storage,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn wait_for_order(storage: &MemoryOrderStorage, uid: &str) -> bool {
    for _ in 0..50 {
        if storage.get(uid).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// == Read Path Tests ==

#[tokio::test]
async fn test_get_order_from_storage_then_cache() {
    let app = create_test_app(10);
    let order = Order::new(UID)
        .with_field("track_number", "WBILMTESTTRACK")
        .with_field("delivery", json!({ "city": "Kiryat Mozkin" }));
    app.storage.save(&order).await.unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/orders/{}", UID)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["order_uid"], UID);
    assert_eq!(json["track_number"], "WBILMTESTTRACK");
    assert_eq!(json["delivery"]["city"], "Kiryat Mozkin");
    assert!(app.cache.contains(UID));

    // Second lookup is served from the cache
    let response = app
        .router
        .oneshot(get(&format!("/orders/{}", UID)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.cache.stats().hits, 1);
}

#[tokio::test]
async fn test_get_order_unknown() {
    let app = create_test_app(10);

    let response = app
        .router
        .oneshot(get("/orders/aaaaaaaaaaaaaaaaaaa"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "not found");
}

#[tokio::test]
async fn test_get_order_malformed_uid() {
    let app = create_test_app(10);

    let response = app.router.oneshot(get("/orders/short")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("19"));
}

#[tokio::test]
async fn test_backfill_respects_capacity() {
    let app = create_test_app(2);
    let uids = ["aaaaaaaaaaaaaaaaaaa", "bbbbbbbbbbbbbbbbbbb", "ccccccccccccccccccc"];
    for uid in uids {
        app.storage.save(&Order::new(uid)).await.unwrap();
    }

    for uid in uids {
        let response = app
            .router
            .clone()
            .oneshot(get(&format!("/orders/{}", uid)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.cache.len(), 2);
    assert!(!app.cache.contains("aaaaaaaaaaaaaaaaaaa"));
}

// == Ingestion Tests ==

#[tokio::test]
async fn test_published_order_becomes_readable() {
    let app = create_test_app(10);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from(format!(r#"{{"order_uid":"{}","locale":"en"}}"#, UID)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    assert!(wait_for_order(&app.storage, UID).await);
    // Ingestion never populates the cache
    assert!(!app.cache.contains(UID));

    let response = app
        .router
        .oneshot(get(&format!("/orders/{}", UID)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["locale"], "en");
}

#[tokio::test]
async fn test_invalid_published_order_is_dropped() {
    let app = create_test_app(10);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .body(Body::from(r#"{"order_uid":"NOT-VALID"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Accepted onto the feed, rejected by ingestion
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.storage.is_empty().await);
}

// == Auxiliary Endpoints ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app(10);
    app.cache.add(UID, Order::new(UID));

    let response = app.router.oneshot(get("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["capacity"], 10);
    assert_eq!(json["hits"], 0);
}

#[tokio::test]
async fn test_ping_endpoint() {
    let app = create_test_app(10);

    let response = app.router.oneshot(get("/ping")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"pong");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(10);

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_test_app(10);

    let response = app.router.oneshot(get("/nonexistent")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
