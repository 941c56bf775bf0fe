//! PostgreSQL snapshot store
//!
//! Persists cache entries into the `cache` table, separate from the
//! authoritative `orders` table.

use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use serde_json::Value;
use tokio_postgres::error::SqlState;
use tracing::debug;

use crate::db::create_pool;
use crate::error::{PersistenceError, PersistenceResult, Phase};
use crate::persistence::{SnapshotRow, SnapshotStore};

const CREATE_CACHE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS cache (
        id CHAR(19) PRIMARY KEY,
        data JSONB NOT NULL,
        UNIQUE (id, data)
    );
";

const CHECK_CACHE_TABLE: &str = "
    SELECT COUNT(table_name)
    FROM information_schema.tables
    WHERE table_schema LIKE 'public'
      AND table_type LIKE 'BASE TABLE'
      AND table_name = 'cache';
";

const INSERT_ROW: &str = "INSERT INTO cache (id, data) VALUES ($1, $2)";
const SELECT_ROWS: &str = "SELECT id, data FROM cache";
const TRUNCATE_TABLE: &str = "TRUNCATE TABLE cache";

/// Connections needed by the snapshot store; it runs one operation at a time.
const POOL_SIZE: usize = 2;

/// Snapshot store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgSnapshotStore {
    pool: Pool,
}

impl PgSnapshotStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a store with its own small pool for `database_url`.
    pub fn connect(database_url: &str) -> PersistenceResult<Self> {
        let pool = create_pool(database_url, POOL_SIZE)
            .map_err(|e| PersistenceError::unavailable("snapshot.connect", e))?;
        Ok(Self::new(pool))
    }

    async fn client(&self, op: &'static str) -> PersistenceResult<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| PersistenceError::unavailable(op, e))
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn ensure_table(&self) -> PersistenceResult<()> {
        const OP: &str = "snapshot.ensure_table";

        let client = self.client(OP).await?;
        client
            .batch_execute(CREATE_CACHE_TABLE)
            .await
            .map_err(|e| PersistenceError::schema(OP, e))
    }

    async fn table_exists(&self) -> PersistenceResult<bool> {
        const OP: &str = "snapshot.table_exists";

        let client = self.client(OP).await?;
        let stmt = client
            .prepare(CHECK_CACHE_TABLE)
            .await
            .map_err(|e| PersistenceError::query(OP, Phase::Prepare, e))?;
        let row = client
            .query_one(&stmt, &[])
            .await
            .map_err(|e| PersistenceError::schema(OP, e))?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| PersistenceError::query(OP, Phase::Scan, e))?;

        Ok(count > 0)
    }

    async fn insert_rows(&self, rows: &[SnapshotRow]) -> PersistenceResult<usize> {
        const OP: &str = "snapshot.insert_rows";

        let client = self.client(OP).await?;
        let stmt = client
            .prepare(INSERT_ROW)
            .await
            .map_err(|e| PersistenceError::query(OP, Phase::Prepare, e))?;

        let mut count = 0;
        for row in rows {
            client
                .execute(&stmt, &[&row.id, &row.data])
                .await
                .map_err(|e| {
                    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                        PersistenceError::Duplicate {
                            op: OP,
                            id: row.id.clone(),
                        }
                    } else {
                        PersistenceError::query(OP, Phase::Execute, e)
                    }
                })?;
            count += 1;
            debug!(id = %row.id, "Cache entry saved");
        }

        Ok(count)
    }

    async fn load_rows(&self) -> PersistenceResult<Vec<SnapshotRow>> {
        const OP: &str = "snapshot.load_rows";

        let client = self.client(OP).await?;
        let stmt = client
            .prepare(SELECT_ROWS)
            .await
            .map_err(|e| PersistenceError::query(OP, Phase::Prepare, e))?;
        let rows = client
            .query(&stmt, &[])
            .await
            .map_err(|e| PersistenceError::query(OP, Phase::Execute, e))?;

        rows.iter()
            .map(|row| {
                let id: String = row
                    .try_get(0)
                    .map_err(|e| PersistenceError::query(OP, Phase::Scan, e))?;
                let data: Value = row
                    .try_get(1)
                    .map_err(|e| PersistenceError::query(OP, Phase::Scan, e))?;
                Ok(SnapshotRow::new(id.trim_end(), data))
            })
            .collect()
    }

    async fn truncate(&self) -> PersistenceResult<()> {
        const OP: &str = "snapshot.truncate";

        let client = self.client(OP).await?;
        client
            .batch_execute(TRUNCATE_TABLE)
            .await
            .map_err(|e| PersistenceError::query(OP, Phase::Execute, e))
    }
}
