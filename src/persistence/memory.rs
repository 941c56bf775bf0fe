//! In-memory snapshot store
//!
//! Keeps the snapshot table in process memory, for exercising the
//! evacuate/restore protocol without a database.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{PersistenceError, PersistenceResult, Phase};
use crate::persistence::{SnapshotRow, SnapshotStore};

/// Snapshot store holding its table in memory.
///
/// `None` models a table that has never been created.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    table: Mutex<Option<Vec<SnapshotRow>>>,
    write_delay: Option<Duration>,
}

impl MemorySnapshotStore {
    /// Creates a store whose table does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose table already holds `rows`.
    pub fn with_rows(rows: Vec<SnapshotRow>) -> Self {
        Self {
            table: Mutex::new(Some(rows)),
            write_delay: None,
        }
    }

    /// Delays every inserted row by `delay`, simulating a slow store.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Returns a copy of the stored rows, or None if the table is absent.
    pub async fn rows(&self) -> Option<Vec<SnapshotRow>> {
        self.table.lock().await.clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn ensure_table(&self) -> PersistenceResult<()> {
        self.table.lock().await.get_or_insert_with(Vec::new);
        Ok(())
    }

    async fn table_exists(&self) -> PersistenceResult<bool> {
        Ok(self.table.lock().await.is_some())
    }

    async fn insert_rows(&self, rows: &[SnapshotRow]) -> PersistenceResult<usize> {
        const OP: &str = "snapshot.insert_rows";

        let mut count = 0;
        for row in rows {
            if let Some(delay) = self.write_delay {
                tokio::time::sleep(delay).await;
            }

            let mut table = self.table.lock().await;
            let stored = table.as_mut().ok_or_else(|| {
                PersistenceError::query(OP, Phase::Execute, "relation \"cache\" does not exist")
            })?;
            if stored.iter().any(|existing| existing.id == row.id) {
                return Err(PersistenceError::Duplicate {
                    op: OP,
                    id: row.id.clone(),
                });
            }
            stored.push(row.clone());
            count += 1;
        }

        Ok(count)
    }

    async fn load_rows(&self) -> PersistenceResult<Vec<SnapshotRow>> {
        Ok(self.table.lock().await.clone().unwrap_or_default())
    }

    async fn truncate(&self) -> PersistenceResult<()> {
        if let Some(rows) = self.table.lock().await.as_mut() {
            rows.clear();
        }
        Ok(())
    }
}
