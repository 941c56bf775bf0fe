//! Order Ingestion Task
//!
//! Background task that consumes raw order messages from the feed, validates
//! them and writes them to order storage. It never touches the cache; orders
//! reach the cache through read-path backfill.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::IngestError;
use crate::models::Order;
use crate::storage::OrderStorage;

/// Sending half of the order feed; each message is one JSON-encoded order.
pub type FeedSender = mpsc::Sender<Vec<u8>>;
/// Receiving half of the order feed.
pub type FeedReceiver = mpsc::Receiver<Vec<u8>>;

/// Decodes, validates and stores a single feed message.
///
/// Returns the stored order.
pub async fn process_message(
    storage: &dyn OrderStorage,
    message: &[u8],
) -> Result<Order, IngestError> {
    let order: Order = serde_json::from_slice(message)?;

    if let Some(reason) = order.validate() {
        return Err(IngestError::Invalid(reason));
    }

    storage.save(&order).await?;
    Ok(order)
}

/// Spawns the task that drains the order feed into storage.
///
/// A message that fails to decode, validate or save is logged and dropped;
/// the task keeps going. It finishes once every [`FeedSender`] is dropped
/// and the buffered messages have been processed.
///
/// # Returns
/// A JoinHandle for the spawned task, awaited during graceful shutdown.
pub fn spawn_ingest_task(mut feed: FeedReceiver, storage: Arc<dyn OrderStorage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting order ingestion task");

        let mut saved: u64 = 0;
        while let Some(message) = feed.recv().await {
            match process_message(storage.as_ref(), &message).await {
                Ok(order) => {
                    saved += 1;
                    info!(order_uid = %order.order_uid, "Order has been saved");
                }
                Err(e) => warn!("Failed to process order message: {}", e),
            }
        }

        info!(saved, "Order feed closed, ingestion task finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryOrderStorage;
    use serde_json::json;

    fn message(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn test_process_valid_message() {
        let storage = MemoryOrderStorage::new();
        let msg = message(json!({ "order_uid": "b563feb7b2b84b6test", "locale": "en" }));

        let order = process_message(&storage, &msg).await.unwrap();

        assert_eq!(order.order_uid, "b563feb7b2b84b6test");
        assert_eq!(storage.get("b563feb7b2b84b6test").await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_process_malformed_message() {
        let storage = MemoryOrderStorage::new();

        let result = process_message(&storage, b"{not json").await;

        assert!(matches!(result, Err(IngestError::Decode(_))));
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_process_invalid_order() {
        let storage = MemoryOrderStorage::new();
        let msg = message(json!({ "order_uid": "TOO-SHORT" }));

        let result = process_message(&storage, &msg).await;

        assert!(matches!(result, Err(IngestError::Invalid(_))));
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_process_duplicate_order() {
        let storage = MemoryOrderStorage::new();
        let msg = message(json!({ "order_uid": "b563feb7b2b84b6test" }));

        process_message(&storage, &msg).await.unwrap();
        let result = process_message(&storage, &msg).await;

        assert!(matches!(
            result,
            Err(IngestError::Storage(StorageError::AlreadyExists(_)))
        ));
    }

    #[tokio::test]
    async fn test_ingest_task_drains_feed_and_skips_bad_messages() {
        let storage = Arc::new(MemoryOrderStorage::new());
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_ingest_task(rx, storage.clone());

        tx.send(message(json!({ "order_uid": "aaaaaaaaaaaaaaaaaaa" })))
            .await
            .unwrap();
        tx.send(b"garbage".to_vec()).await.unwrap();
        tx.send(message(json!({ "order_uid": "bbbbbbbbbbbbbbbbbbb" })))
            .await
            .unwrap();
        drop(tx);

        // Task finishes once the feed is closed
        handle.await.unwrap();

        assert_eq!(storage.len().await, 2);
        assert!(storage.get("aaaaaaaaaaaaaaaaaaa").await.is_ok());
        assert!(storage.get("bbbbbbbbbbbbbbbbbbb").await.is_ok());
    }
}
