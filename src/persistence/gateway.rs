//! Evacuate / restore protocol between the LRU cache and a snapshot store.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::cache::LruCache;
use crate::error::{PersistenceError, PersistenceResult};
use crate::persistence::{PgSnapshotStore, SnapshotRow, SnapshotStore};

// == Evacuate ==
/// Writes every cache entry into the snapshot store.
///
/// Entries are copied out under the cache lock and written afterwards, most
/// recently used first. An empty cache is a no-op and leaves the store
/// untouched. Returns the number of entries persisted.
pub async fn evacuate<V, S>(cache: &LruCache<V>, store: &S) -> PersistenceResult<usize>
where
    V: Clone + Serialize,
    S: SnapshotStore + ?Sized,
{
    const OP: &str = "cache.evacuate";

    let snapshot = cache.snapshot();
    if snapshot.is_empty() {
        info!("Cache is already clear, nothing to evacuate");
        return Ok(0);
    }

    store.ensure_table().await?;

    let rows = snapshot
        .into_iter()
        .map(|entry| {
            let (id, value) = entry.into_parts();
            match serde_json::to_value(&value) {
                Ok(data) => Ok(SnapshotRow::new(id, data)),
                Err(source) => Err(PersistenceError::Serialization { op: OP, id, source }),
            }
        })
        .collect::<PersistenceResult<Vec<_>>>()?;

    let count = store.insert_rows(&rows).await?;
    info!(count, "Cache evacuated");
    Ok(count)
}

/// Runs [`evacuate`] under a deadline.
///
/// Expiry fails with [`PersistenceError::Timeout`]; rows written before the
/// deadline stay in the store.
pub async fn evacuate_within<V, S>(
    cache: &LruCache<V>,
    store: &S,
    deadline: Duration,
) -> PersistenceResult<usize>
where
    V: Clone + Serialize,
    S: SnapshotStore + ?Sized,
{
    tokio::time::timeout(deadline, evacuate(cache, store))
        .await
        .map_err(|_| PersistenceError::Timeout {
            op: "cache.evacuate",
            after: deadline,
        })?
}

// == Restore ==
/// Loads a previously evacuated snapshot back into the cache.
///
/// A missing or empty table is a successful no-op. Each row goes through
/// [`LruCache::add`], so the capacity bound applies and surplus rows evict
/// earlier ones. The table is truncated only after every row was added,
/// which makes a second restore a no-op. On failure, entries already added
/// stay in the cache.
pub async fn restore<V, S>(cache: &LruCache<V>, store: &S) -> PersistenceResult<usize>
where
    V: Clone + DeserializeOwned,
    S: SnapshotStore + ?Sized,
{
    const OP: &str = "cache.restore";

    if !store.table_exists().await? {
        info!("No cache snapshot table, starting with an empty cache");
        return Ok(0);
    }

    let rows = store.load_rows().await?;
    if rows.is_empty() {
        info!("Cache snapshot is empty");
        return Ok(0);
    }

    let mut restored = 0;
    for SnapshotRow { id, data } in rows {
        let value: V = match serde_json::from_value(data) {
            Ok(value) => value,
            Err(source) => return Err(PersistenceError::Serialization { op: OP, id, source }),
        };
        debug!(id = %id, "Cache entry restored");
        cache.add(id, value);
        restored += 1;
    }

    store.truncate().await?;
    info!(restored, "Cache fully restored");
    Ok(restored)
}

// == Process Hooks ==
/// Restores `cache` from the PostgreSQL database at `database_url`.
///
/// Called once at startup, before the HTTP listener accepts connections.
pub async fn restore_from_db<V>(cache: &LruCache<V>, database_url: &str) -> PersistenceResult<usize>
where
    V: Clone + DeserializeOwned,
{
    let store = PgSnapshotStore::connect(database_url)?;
    restore(cache, &store).await
}

/// Evacuates `cache` into the PostgreSQL database at `database_url`,
/// failing if it takes longer than `deadline`.
///
/// Called once during graceful shutdown, after traffic has drained.
pub async fn evacuate_to_db<V>(
    cache: &LruCache<V>,
    database_url: &str,
    deadline: Duration,
) -> PersistenceResult<usize>
where
    V: Clone + Serialize,
{
    let store = PgSnapshotStore::connect(database_url)?;
    evacuate_within(cache, &store, deadline).await
}
