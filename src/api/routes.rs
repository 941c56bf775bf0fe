//! API Routes
//!
//! Configures the Axum router with all order service endpoints.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    get_order_handler, health_handler, ping_handler, publish_order_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /orders/:order_uid` - Look up an order (cache, then storage)
/// - `POST /orders` - Queue a raw order message for ingestion
/// - `GET /stats` - Cache statistics
/// - `GET /ping` - Liveness probe
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Timeout: Fails requests running longer than `request_timeout`
/// - Tracing: Logs all requests
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/orders", post(publish_order_handler))
        .route("/orders/:order_uid", get(get_order_handler))
        .route("/stats", get(stats_handler))
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LruCache;
    use crate::storage::MemoryOrderStorage;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let (tx, _rx) = mpsc::channel(1);
        let state = AppState::new(
            Arc::new(LruCache::new(10)),
            Arc::new(MemoryOrderStorage::new()),
            tx,
        );
        create_router(state, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_ping_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_order_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/orders/b563feb7b2b84b6test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_order_bad_uid() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/orders/UPPERCASE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
