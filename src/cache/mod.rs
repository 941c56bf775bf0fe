//! Cache Module
//!
//! Provides a bounded in-memory LRU cache shared by request handlers.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::RecencyList;
pub use stats::CacheStats;
pub use store::LruCache;

// == Public Constants ==
/// Default number of orders kept in memory
pub const DEFAULT_CAPACITY: usize = 200;
