//! Evaluation engine for language-model tool selection.
//!
//! Given the tool calls a test case expects and the calls a model actually
//! made, this crate produces correctness signals:
//!
//! - per-call classification (`TP`, `FP`, `FN`, `TN`),
//! - a 0-10 parameter score per matched call,
//! - a confidence category combining self-reported confidence with correctness,
//! - precision, recall and F1 over many runs.
//!
//! Everything is a pure, synchronous computation over in-memory values. The
//! crate performs no I/O and installs no `tracing` subscriber.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tool_eval::{
//!     ActualToolCall, Classification, ExpectedToolCall, MatchStrategy, MetricsService,
//!     NoSchemas, RunEvaluator,
//! };
//!
//! let expected = vec![
//!     ExpectedToolCall::new("weather-server", "get_forecast")
//!         .with_parameter("city", json!("Oslo"))
//!         .with_parameter("days", json!(3)),
//! ];
//! let actual = vec![
//!     ActualToolCall::new("get_forecast")
//!         .with_parameter("city", json!("oslo"))
//!         .with_parameter("days", json!(3.0)),
//! ];
//!
//! let evaluation = RunEvaluator::default()
//!     .evaluate(&expected, &actual, MatchStrategy::OrderIndependent, &NoSchemas, Some(0.8), None)
//!     .unwrap();
//! assert_eq!(evaluation.classification, Classification::TruePositive);
//! assert_eq!(evaluation.parameter_score, Some(10.0));
//!
//! let summary = MetricsService::new().summarize(&[evaluation.to_run_record("run-1", Some(420))]);
//! assert!((summary.precision - 1.0).abs() < f64::EPSILON);
//! ```
//!
//! # Parameter Scoring
//!
//! | Component | Points |
//! |-----------|--------|
//! | Expected parameters present | 2.5 × fraction |
//! | Values equal after normalization | 2.5 × fraction |
//! | Runtime types agree | 2.5 × fraction |
//! | No parameters beyond the expected ones | 2.5 or 0 |
//!
//! # Schemas
//!
//! Tool schemas are JSON-Schema-like documents. [`ToolParameterSchema::from_json`]
//! inlines local `$ref`s, and a caller-owned [`SchemaCache`] can be handed to a
//! [`ParameterValidator`] to reuse resolutions across runs.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod confidence;
mod config;
mod constants;
mod error;
mod matcher;
mod metrics;
pub mod prelude;
mod report;
mod schema;
mod schema_cache;
mod tool_call;
mod validator;
mod value;

pub use confidence::{
    ConfidenceAnalysis, ConfidenceAnalyzer, ConfidenceCategory, ConfidenceDescription,
    ConfidenceLevel,
};
pub use config::EngineConfig;
pub use constants::{
    DEFAULT_SCHEMA_CACHE_CAPACITY, DEFAULT_SCHEMA_CACHE_EVICTION, HIGH_CONFIDENCE_THRESHOLD,
    LOW_CONFIDENCE_THRESHOLD, MAX_PARAMETER_SCORE, MISLEADING_DESCRIPTION,
    NEEDS_CLARITY_DESCRIPTION, PARAMETER_COMPONENT_WEIGHT, ROBUST_DESCRIPTION,
};
pub use error::{EvalError, InvalidInputError, SchemaError};
pub use matcher::{
    Classification, MatchResult, MatchStrategy, NoSchemas, ParameterScore, SchemaLookup,
    ToolCallMatcher, average_parameter_score, classify_run, score_parameters,
};
pub use metrics::{
    ConfidenceCategoryCounts, MetricsService, MetricsSummary, PrecisionRecallMetrics, RunRecord,
    ToolCallRecord, mean,
};
pub use report::{ReportMetadata, RunEvaluation, RunEvaluator};
pub use schema::{JsonType, PropertySchema, ToolParameterSchema, resolve_refs};
pub use schema_cache::{CacheStats, SchemaCache};
pub use tool_call::{ActualToolCall, ExpectedToolCall, Parameters};
pub use validator::{ParameterComparison, ParameterValidationResult, ParameterValidator};
pub use value::{RuntimeType, types_match, values_match};
