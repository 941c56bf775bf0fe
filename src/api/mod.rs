//! API Module
//!
//! HTTP handlers and routing for the order service REST API.
//!
//! # Endpoints
//! - `GET /orders/:order_uid` - Look up an order
//! - `POST /orders` - Queue an order message for ingestion
//! - `GET /stats` - Cache statistics
//! - `GET /ping` - Liveness probe
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
