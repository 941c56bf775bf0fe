//! Order Storage Module
//!
//! The authoritative copy of every order, keyed by `order_uid`. The cache
//! only accelerates reads against it.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::Order;

pub use memory::MemoryOrderStorage;
pub use postgres::PgOrderStorage;

/// Durable order store used by the read path and the ingestion pipeline.
#[async_trait]
pub trait OrderStorage: Send + Sync {
    /// Stores a new order. Fails with `AlreadyExists` if the id is taken.
    async fn save(&self, order: &Order) -> StorageResult<()>;

    /// Looks up an order. Fails with `NotFound` if there is none.
    async fn get(&self, order_uid: &str) -> StorageResult<Order>;
}
