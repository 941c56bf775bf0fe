//! Order Service - order lookups backed by PostgreSQL
//!
//! Serves orders through a bounded LRU cache that is saved to the database
//! at shutdown and restored from it at startup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_service::api::{create_router, AppState};
use order_service::persistence::{evacuate_to_db, restore_from_db};
use order_service::storage::{OrderStorage, PgOrderStorage};
use order_service::{db, spawn_ingest_task, Config};

/// How long the ingestion task may take to drain buffered messages at shutdown
const INGEST_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Main entry point for the order service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration
/// 3. Connect order storage and create its schema
/// 4. Start the ingestion task on the order feed
/// 5. Restore the cache from its last snapshot
/// 6. Serve HTTP until SIGINT/SIGTERM
///
/// # Shutdown Sequence
/// 1. Stop accepting requests and drain in-flight ones
/// 2. Let the ingestion task finish buffered messages
/// 3. Evacuate the cache to the database within the grace period
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Order Service");

    let config = Config::load().context("loading configuration")?;
    info!(
        "Configuration loaded: cache_capacity={}, port={}, evacuate_timeout={}s",
        config.cache_capacity, config.server_port, config.evacuate_timeout
    );
    if config.cache_capacity == 0 {
        warn!("Cache capacity is 0, every lookup will go to the database");
    }

    let pool = db::create_pool(&config.database_url, config.db_pool_size)
        .context("creating database pool")?;
    let pg_storage = PgOrderStorage::new(pool);
    pg_storage
        .init_schema()
        .await
        .context("initializing order storage")?;
    let storage: Arc<dyn OrderStorage> = Arc::new(pg_storage);
    info!("Order storage initialized");

    let (feed_tx, feed_rx) = mpsc::channel(config.feed_buffer.max(1));
    let ingest_handle = spawn_ingest_task(feed_rx, storage.clone());

    let state = AppState::from_config(&config, storage, feed_tx);
    let cache = state.cache.clone();

    // A failed restore leaves whatever was restored so far and still starts
    match restore_from_db(cache.as_ref(), &config.database_url).await {
        Ok(restored) => info!("Cache restored, entries: [{}]", restored),
        Err(e) => error!("Failed to restore cache: {}", e),
    }

    let app = create_router(state, config.request_timeout());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    info!("HTTP server stopped");

    // The router held the last feed sender, so the ingestion loop now ends
    if tokio::time::timeout(INGEST_DRAIN_TIMEOUT, ingest_handle)
        .await
        .is_err()
    {
        warn!("Ingestion task did not finish within {:?}", INGEST_DRAIN_TIMEOUT);
    }

    match evacuate_to_db(cache.as_ref(), &config.database_url, config.evacuate_timeout()).await {
        Ok(count) => info!("Cache evacuated successfully, entries: [{}]", count),
        Err(e) => {
            error!("Failed to evacuate cache, cached orders are lost: {}", e);
            std::process::exit(1);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
