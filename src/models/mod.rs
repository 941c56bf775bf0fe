//! Order model and response DTOs for the order service
//!
//! This module defines the order record and the types used for
//! serializing HTTP response bodies.

pub mod order;
pub mod responses;

// Re-export commonly used types
pub use order::{is_valid_order_uid, Order, ORDER_UID_LEN};
pub use responses::{ErrorResponse, HealthResponse, PublishResponse, StatsResponse};
