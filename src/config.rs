//! Configuration for the evaluation engine.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_SCHEMA_CACHE_CAPACITY, DEFAULT_SCHEMA_CACHE_EVICTION, HIGH_CONFIDENCE_THRESHOLD,
    LOW_CONFIDENCE_THRESHOLD,
};

/// Configuration for the evaluation engine.
///
/// Controls confidence bucketing and schema cache sizing. Missing fields
/// take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Confidence at or above this value counts as high.
    ///
    /// Default: 0.7
    pub high_confidence_threshold: f64,

    /// Confidence strictly below this value counts as low.
    ///
    /// Default: 0.4
    pub low_confidence_threshold: f64,

    /// Maximum resolved schemas held by a schema cache.
    ///
    /// Default: 1000
    pub schema_cache_capacity: usize,

    /// Oldest entries dropped when the schema cache overflows.
    ///
    /// Default: 200
    pub schema_cache_eviction_batch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            high_confidence_threshold: HIGH_CONFIDENCE_THRESHOLD,
            low_confidence_threshold: LOW_CONFIDENCE_THRESHOLD,
            schema_cache_capacity: DEFAULT_SCHEMA_CACHE_CAPACITY,
            schema_cache_eviction_batch: DEFAULT_SCHEMA_CACHE_EVICTION,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the confidence thresholds.
    #[must_use]
    pub const fn with_confidence_thresholds(mut self, low: f64, high: f64) -> Self {
        self.low_confidence_threshold = low;
        self.high_confidence_threshold = high;
        self
    }

    /// Sets the schema cache capacity and eviction batch.
    #[must_use]
    pub const fn with_schema_cache(mut self, capacity: usize, eviction_batch: usize) -> Self {
        self.schema_cache_capacity = capacity;
        self.schema_cache_eviction_batch = eviction_batch;
        self
    }
}
