//! Cache Entry Module
//!
//! Defines the key/value pair held by the cache.

// == Cache Entry ==
/// A single cache entry: an opaque key and the payload stored under it.
///
/// The cache never inspects `value`; it is moved in on insert and cloned
/// out on reads.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// Identifier the entry is addressed by
    pub key: String,
    /// The stored payload
    pub value: V,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub fn new(key: String, value: V) -> Self {
        Self { key, value }
    }

    /// Splits the entry into its key and value.
    pub fn into_parts(self) -> (String, V) {
        (self.key, self.value)
    }
}
