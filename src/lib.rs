//! Order Service - order lookups backed by PostgreSQL
//!
//! Serves orders through a bounded LRU cache that is saved to the database
//! at shutdown and restored from it at startup.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod persistence;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::LruCache;
pub use config::Config;
pub use tasks::spawn_ingest_task;
