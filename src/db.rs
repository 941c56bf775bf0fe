//! Database Connection Pool Module
//!
//! Builds deadpool-postgres pools from a connection string. The order
//! storage and the cache snapshot store each get their own pool.

use deadpool_postgres::{
    Config, CreatePoolError, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime,
};
use tokio_postgres::NoTls;

/// Creates a connection pool for `database_url` holding at most `max_size`
/// connections.
///
/// Connections are opened lazily, so an unreachable server is reported on
/// first use rather than here.
pub fn create_pool(database_url: &str, max_size: usize) -> Result<Pool, CreatePoolError> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    cfg.pool = Some(PoolConfig::new(max_size.max(1)));
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
}
