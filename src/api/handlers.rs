//! API Handlers
//!
//! HTTP request handlers for each order service endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use crate::cache::LruCache;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    is_valid_order_uid, HealthResponse, Order, PublishResponse, StatsResponse, ORDER_UID_LEN,
};
use crate::storage::OrderStorage;
use crate::tasks::FeedSender;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe order cache
    pub cache: Arc<LruCache<Order>>,
    /// Authoritative order storage
    pub storage: Arc<dyn OrderStorage>,
    /// Feed the ingestion task consumes
    pub feed: FeedSender,
}

impl AppState {
    pub fn new(cache: Arc<LruCache<Order>>, storage: Arc<dyn OrderStorage>, feed: FeedSender) -> Self {
        Self {
            cache,
            storage,
            feed,
        }
    }

    /// Creates a new AppState with an empty cache sized from configuration.
    pub fn from_config(config: &Config, storage: Arc<dyn OrderStorage>, feed: FeedSender) -> Self {
        Self::new(Arc::new(LruCache::new(config.cache_capacity)), storage, feed)
    }
}

/// Handler for GET /orders/:order_uid
///
/// Serves from the cache when possible. On a miss the order is read from
/// storage and added to the cache before being returned.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>> {
    if !is_valid_order_uid(&order_uid) {
        return Err(ApiError::InvalidRequest(format!(
            "order_uid must be {} lowercase alphanumeric characters",
            ORDER_UID_LEN
        )));
    }

    if let Some(order) = state.cache.get(&order_uid) {
        debug!(order_uid = %order_uid, "Cache hit");
        return Ok(Json(order));
    }

    let order = state.storage.get(&order_uid).await?;
    state.cache.add(order_uid.clone(), order.clone());
    info!(order_uid = %order_uid, "Order loaded from storage");

    Ok(Json(order))
}

/// Handler for POST /orders
///
/// Queues a raw order message on the ingestion feed. Validation happens in
/// the ingestion task, as for any other feed message.
pub async fn publish_order_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<PublishResponse>)> {
    if body.is_empty() {
        return Err(ApiError::InvalidRequest("Message body cannot be empty".to_string()));
    }

    let bytes = body.len();
    state
        .feed
        .send(body.to_vec())
        .await
        .map_err(|_| ApiError::Unavailable("ingestion feed is closed".to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(PublishResponse::new(bytes))))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /ping
pub async fn ping_handler() -> &'static str {
    "pong"
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
