//! Constants for tool-call scoring, confidence bucketing and persistence.

/// Maximum parameter score for a single matched tool call.
pub const MAX_PARAMETER_SCORE: f64 = 10.0;

/// Points awarded by each of the four parameter scoring components.
pub const PARAMETER_COMPONENT_WEIGHT: f64 = 2.5;

/// Confidence at or above this value is considered high.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Confidence strictly below this value is considered low.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.4;

/// Default number of resolved schemas a [`SchemaCache`](crate::SchemaCache) holds.
pub const DEFAULT_SCHEMA_CACHE_CAPACITY: usize = 1000;

/// Default number of oldest entries dropped when the schema cache overflows.
pub const DEFAULT_SCHEMA_CACHE_EVICTION: usize = 200;

/// Strings that an expected `true` boolean accepts from a string-typed value.
pub const TRUTHY_STRINGS: [&str; 3] = ["true", "yes", "1"];

/// Persisted description for high confidence with a perfect parameter score.
pub const ROBUST_DESCRIPTION: &str = "robust description";

/// Persisted description for any other scored outcome.
pub const NEEDS_CLARITY_DESCRIPTION: &str = "needs clarity";

/// Persisted description for high confidence with a zero parameter score.
pub const MISLEADING_DESCRIPTION: &str = "misleading description";

/// Justification recorded when an expected call has no matching actual call.
pub const NOT_CALLED_JUSTIFICATION: &str = "Expected tool not called by LLM";

/// Justification recorded when nothing was expected of the parameters.
pub const NO_PARAMETERS_EXPECTED: &str = "No parameters expected, full score";

/// Justification recorded when parameters were expected but none were sent.
pub const NO_PARAMETERS_PROVIDED: &str = "No parameters provided by LLM";

/// Justification recorded for a flawless parameter set.
pub const PERFECT_PARAMETER_MATCH: &str = "Perfect parameter match";
