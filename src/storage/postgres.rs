//! PostgreSQL order storage
//!
//! Orders are kept as JSONB documents in the `orders` table.

use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use serde_json::Value;
use tokio_postgres::error::SqlState;

use crate::error::{Phase, StorageError, StorageResult};
use crate::models::Order;
use crate::storage::OrderStorage;

const CREATE_ORDERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS orders (
        id CHAR(19) PRIMARY KEY,
        data JSONB NOT NULL,
        UNIQUE (id, data)
    );
";

const INSERT_ORDER: &str = "INSERT INTO orders (id, data) VALUES ($1, $2)";
const SELECT_ORDER: &str = "SELECT data FROM orders WHERE id = $1";

/// Order storage backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgOrderStorage {
    pool: Pool,
}

impl PgOrderStorage {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Creates the `orders` table if it does not exist yet.
    pub async fn init_schema(&self) -> StorageResult<()> {
        const OP: &str = "storage.init_schema";

        let client = self.client(OP).await?;
        client
            .batch_execute(CREATE_ORDERS_TABLE)
            .await
            .map_err(|e| StorageError::Query {
                op: OP,
                phase: Phase::Schema,
                source: e.into(),
            })
    }

    async fn client(&self, op: &'static str) -> StorageResult<Object> {
        self.pool.get().await.map_err(|e| StorageError::Unavailable {
            op,
            source: e.into(),
        })
    }
}

#[async_trait]
impl OrderStorage for PgOrderStorage {
    async fn save(&self, order: &Order) -> StorageResult<()> {
        const OP: &str = "storage.save";

        let data = serde_json::to_value(order).map_err(|source| StorageError::Serialization {
            op: OP,
            id: order.order_uid.clone(),
            source,
        })?;

        let client = self.client(OP).await?;
        let stmt = client
            .prepare_cached(INSERT_ORDER)
            .await
            .map_err(|e| StorageError::Query {
                op: OP,
                phase: Phase::Prepare,
                source: e.into(),
            })?;

        client
            .execute(&stmt, &[&order.order_uid, &data])
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    StorageError::AlreadyExists(order.order_uid.clone())
                } else {
                    StorageError::Query {
                        op: OP,
                        phase: Phase::Execute,
                        source: e.into(),
                    }
                }
            })?;

        Ok(())
    }

    async fn get(&self, order_uid: &str) -> StorageResult<Order> {
        const OP: &str = "storage.get";

        let client = self.client(OP).await?;
        let stmt = client
            .prepare_cached(SELECT_ORDER)
            .await
            .map_err(|e| StorageError::Query {
                op: OP,
                phase: Phase::Prepare,
                source: e.into(),
            })?;

        let row = client
            .query_opt(&stmt, &[&order_uid])
            .await
            .map_err(|e| StorageError::Query {
                op: OP,
                phase: Phase::Execute,
                source: e.into(),
            })?
            .ok_or_else(|| StorageError::NotFound(order_uid.to_string()))?;

        let data: Value = row.try_get(0).map_err(|e| StorageError::Query {
            op: OP,
            phase: Phase::Scan,
            source: e.into(),
        })?;

        serde_json::from_value(data).map_err(|source| StorageError::Serialization {
            op: OP,
            id: order_uid.to_string(),
            source,
        })
    }
}
