//! Cache Persistence Module
//!
//! Carries cache contents across process restarts. At shutdown the cache is
//! evacuated into a dedicated `cache` table; at startup it is restored from
//! that table, which is then truncated.
//!
//! The gateway functions talk to a [`SnapshotStore`]; PostgreSQL is the
//! production backend and an in-memory store backs the tests.

mod gateway;
mod memory;
mod postgres;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PersistenceResult;

pub use gateway::{evacuate, evacuate_to_db, evacuate_within, restore, restore_from_db};
pub use memory::MemorySnapshotStore;
pub use postgres::PgSnapshotStore;

// == Snapshot Row ==
/// One persisted cache entry: identifier and serialized payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub id: String,
    pub data: Value,
}

impl SnapshotRow {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

// == Snapshot Store ==
/// Storage backend for the persisted cache table.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Creates the snapshot table if it does not exist yet.
    async fn ensure_table(&self) -> PersistenceResult<()>;

    /// Checks whether the snapshot table exists.
    async fn table_exists(&self) -> PersistenceResult<bool>;

    /// Inserts rows in order, stopping at the first failure.
    ///
    /// Returns the number of rows written. A row whose identifier is already
    /// stored fails with [`PersistenceError::Duplicate`](crate::error::PersistenceError::Duplicate).
    async fn insert_rows(&self, rows: &[SnapshotRow]) -> PersistenceResult<usize>;

    /// Reads every stored row. Order is unspecified.
    async fn load_rows(&self) -> PersistenceResult<Vec<SnapshotRow>>;

    /// Removes every stored row, keeping the table.
    async fn truncate(&self) -> PersistenceResult<()>;
}
