//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use tool_eval::prelude::*;
//!
//! let results = ToolCallMatcher::new()
//!     .match_calls(&[], &[], MatchStrategy::OrderDependent, &NoSchemas)
//!     .unwrap();
//! assert_eq!(classify_run(&results), Classification::TrueNegative);
//! ```

pub use crate::{
    // Calls and schemas
    ActualToolCall, ExpectedToolCall, JsonType, Parameters, PropertySchema, SchemaCache,
    ToolParameterSchema,
    // Matching
    Classification, MatchResult, MatchStrategy, NoSchemas, SchemaLookup, ToolCallMatcher,
    classify_run, score_parameters,
    // Validation
    ParameterValidationResult, ParameterValidator,
    // Confidence and metrics
    ConfidenceAnalyzer, ConfidenceCategory, ConfidenceDescription, ConfidenceLevel,
    MetricsService, MetricsSummary, RunRecord, ToolCallRecord,
    // Evaluation
    EngineConfig, RunEvaluation, RunEvaluator,
    // Errors
    EvalError, InvalidInputError, SchemaError,
};
