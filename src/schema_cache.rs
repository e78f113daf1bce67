//! Bounded cache of resolved tool schemas.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::config::EngineConfig;
use crate::constants::{DEFAULT_SCHEMA_CACHE_CAPACITY, DEFAULT_SCHEMA_CACHE_EVICTION};
use crate::error::SchemaError;
use crate::schema::ToolParameterSchema;

/// Cache of resolved schemas keyed by the canonical JSON of the raw document.
///
/// The cache is owned by the caller and handed to a
/// [`ParameterValidator`](crate::ParameterValidator) by reference. Uses
/// `RwLock` for interior mutability so one cache can serve many threads.
/// Eviction is FIFO: once the cache holds more than `capacity` entries, the
/// oldest `eviction_batch` entries are dropped.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval::SchemaCache;
///
/// let cache = SchemaCache::new(10, 2);
/// let document = json!({"properties": {"q": {"type": "string"}}});
///
/// let first = cache.resolve(&document).unwrap();
/// let second = cache.resolve(&document).unwrap();
/// assert_eq!(first, second);
/// assert_eq!(cache.stats().hits(), 1);
/// ```
#[derive(Debug)]
pub struct SchemaCache {
    entries: RwLock<Entries>,
    capacity: usize,
    eviction_batch: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

#[derive(Debug, Default)]
struct Entries {
    by_key: HashMap<String, ToolParameterSchema>,
    insertion_order: VecDeque<String>,
}

impl SchemaCache {
    /// Creates a cache holding up to `capacity` schemas.
    ///
    /// An `eviction_batch` of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize, eviction_batch: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity,
            eviction_batch: eviction_batch.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Creates a cache sized by the engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.schema_cache_capacity, config.schema_cache_eviction_batch)
    }

    /// Resolves a raw schema document, reusing a cached result when present.
    ///
    /// Failed resolutions are not cached. If the internal lock is poisoned
    /// the document is resolved without caching.
    ///
    /// # Errors
    ///
    /// Returns the `SchemaError` from [`ToolParameterSchema::from_json`].
    pub fn resolve(&self, document: &Value) -> Result<ToolParameterSchema, SchemaError> {
        let Ok(key) = serde_json::to_string(document) else {
            return ToolParameterSchema::from_json(document);
        };

        if let Ok(entries) = self.entries.read() {
            if let Some(schema) = entries.by_key.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(schema.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let schema = ToolParameterSchema::from_json(document)?;

        if let Ok(mut entries) = self.entries.write() {
            if !entries.by_key.contains_key(&key) {
                entries.insertion_order.push_back(key.clone());
                entries.by_key.insert(key, schema.clone());
                self.evict_overflow(&mut entries);
            }
        }

        Ok(schema)
    }

    fn evict_overflow(&self, entries: &mut Entries) {
        if entries.by_key.len() <= self.capacity {
            return;
        }
        let batch = self.eviction_batch.min(entries.insertion_order.len());
        for key in entries.insertion_order.drain(..batch) {
            entries.by_key.remove(&key);
        }
        self.evictions
            .fetch_add(u64::try_from(batch).unwrap_or(u64::MAX), Ordering::Relaxed);
        tracing::debug!(
            evicted = batch,
            remaining = entries.by_key.len(),
            "Evicted oldest resolved schemas"
        );
    }

    /// Returns the number of cached schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |e| e.by_key.len())
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached schema. Counters are kept.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.by_key.clear();
            entries.insertion_order.clear();
        }
    }

    /// Returns a snapshot of cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_CACHE_CAPACITY, DEFAULT_SCHEMA_CACHE_EVICTION)
    }
}

/// Statistics about a [`SchemaCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached schemas.
    pub entries: usize,
    /// Configured capacity.
    pub capacity: usize,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that required resolution.
    pub misses: u64,
    /// Entries dropped by eviction.
    pub evictions: u64,
}

impl CacheStats {
    /// Returns the number of cached schemas.
    #[must_use]
    pub const fn entries(&self) -> usize {
        self.entries
    }

    /// Returns the cache hits.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Returns the cache misses.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Returns the evicted entry count.
    #[must_use]
    pub const fn evictions(&self) -> u64 {
        self.evictions
    }
}
