//! In-memory order storage

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};
use crate::models::Order;
use crate::storage::OrderStorage;

/// Order storage kept in a HashMap, for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryOrderStorage {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderStorage for MemoryOrderStorage {
    async fn save(&self, order: &Order) -> StorageResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_uid) {
            return Err(StorageError::AlreadyExists(order.order_uid.clone()));
        }
        orders.insert(order.order_uid.clone(), order.clone());
        Ok(())
    }

    async fn get(&self, order_uid: &str) -> StorageResult<Order> {
        self.orders
            .read()
            .await
            .get(order_uid)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(order_uid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_get() {
        let storage = MemoryOrderStorage::new();
        let order = Order::new("b563feb7b2b84b6test").with_field("locale", "en");

        storage.save(&order).await.unwrap();

        assert_eq!(storage.get("b563feb7b2b84b6test").await.unwrap(), order);
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let storage = MemoryOrderStorage::new();

        let result = storage.get("b563feb7b2b84b6test").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_duplicate() {
        let storage = MemoryOrderStorage::new();
        let order = Order::new("b563feb7b2b84b6test");

        storage.save(&order).await.unwrap();
        let result = storage.save(&order).await;

        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(storage.len().await, 1);
    }
}
