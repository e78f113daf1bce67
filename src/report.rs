//! Per-run evaluation and JSON report generation.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::confidence::{
    ConfidenceAnalysis, ConfidenceAnalyzer, ConfidenceDescription, ConfidenceLevel,
};
use crate::error::EvalError;
use crate::matcher::{
    Classification, MatchResult, MatchStrategy, SchemaLookup, ToolCallMatcher,
    average_parameter_score, classify_run,
};
use crate::metrics::{RunRecord, ToolCallRecord};
use crate::tool_call::{ActualToolCall, ExpectedToolCall};

/// Report metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp (RFC 3339).
    pub generated_at: String,
    /// Version of tool-eval.
    pub engine_version: String,
    /// Model that produced the calls, if known.
    pub model: Option<String>,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            model: None,
        }
    }
}

/// Everything the engine derives from one test-case run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvaluation {
    /// Report metadata.
    pub metadata: ReportMetadata,
    /// Strategy used to pair calls.
    pub strategy: MatchStrategy,
    /// Per-call match results.
    pub results: Vec<MatchResult>,
    /// Aggregated run classification.
    pub classification: Classification,
    /// Mean `TP` parameter score, absent without a `TP`.
    pub parameter_score: Option<f64>,
    /// Confidence categorization of the selection.
    pub confidence: ConfidenceAnalysis,
    /// Confidence level the model stated, if any.
    pub confidence_level: Option<ConfidenceLevel>,
    /// Persisted description derived from level and score.
    pub confidence_description: Option<ConfidenceDescription>,
}

impl RunEvaluation {
    /// Sets the model recorded in the metadata.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.metadata.model = Some(model.into());
        self
    }

    /// Converts to the record consumed by
    /// [`MetricsService::summarize`](crate::MetricsService::summarize).
    #[must_use]
    pub fn to_run_record(&self, id: impl Into<String>, execution_time_ms: Option<u64>) -> RunRecord {
        RunRecord {
            id: id.into(),
            classification: Some(self.classification),
            execution_time_ms,
            confidence_description: self
                .confidence_description
                .map(|d| d.as_str().to_string()),
            parameter_correctness: self.parameter_score,
        }
    }

    /// Converts each match result to a tool-call record for `run_id`.
    #[must_use]
    pub fn tool_call_records(&self, run_id: &str) -> Vec<ToolCallRecord> {
        self.results
            .iter()
            .map(|r| ToolCallRecord::from_match(run_id, r))
            .collect()
    }

    /// Serializes to JSON.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, EvalError> {
        serde_json::to_string_pretty(self).map_err(|e| EvalError::Json {
            context: "run evaluation serialization".to_string(),
            message: e.to_string(),
        })
    }

    /// Serializes to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::Json` if serialization fails.
    pub fn to_json_compact(&self) -> Result<String, EvalError> {
        serde_json::to_string(self).map_err(|e| EvalError::Json {
            context: "run evaluation serialization".to_string(),
            message: e.to_string(),
        })
    }
}

/// Runs matching, aggregation and confidence analysis for one run.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval::{
///     ActualToolCall, Classification, ConfidenceLevel, ExpectedToolCall, MatchStrategy,
///     NoSchemas, RunEvaluator,
/// };
///
/// let expected = vec![ExpectedToolCall::new("weather", "forecast").with_parameter("city", json!("Oslo"))];
/// let actual = vec![ActualToolCall::new("forecast").with_parameter("city", json!("oslo"))];
///
/// let evaluation = RunEvaluator::default()
///     .evaluate(
///         &expected,
///         &actual,
///         MatchStrategy::OrderIndependent,
///         &NoSchemas,
///         Some(0.85),
///         Some(ConfidenceLevel::High),
///     )
///     .unwrap();
///
/// assert_eq!(evaluation.classification, Classification::TruePositive);
/// let record = evaluation.to_run_record("run-1", Some(1200));
/// assert_eq!(record.confidence_description.as_deref(), Some("robust description"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RunEvaluator {
    matcher: ToolCallMatcher,
    analyzer: ConfidenceAnalyzer,
}

impl RunEvaluator {
    /// Creates an evaluator with the thresholds in `config`.
    #[must_use]
    pub const fn new(config: &EngineConfig) -> Self {
        Self {
            matcher: ToolCallMatcher::new(),
            analyzer: ConfidenceAnalyzer::new(config),
        }
    }

    /// Evaluates one run.
    ///
    /// The selection counts as correct when the run classifies as `TP` or
    /// `TN`.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::InvalidInput` if the schema lookup fails.
    pub fn evaluate<L: SchemaLookup + ?Sized>(
        &self,
        expected: &[ExpectedToolCall],
        actual: &[ActualToolCall],
        strategy: MatchStrategy,
        lookup: &L,
        confidence: Option<f64>,
        confidence_level: Option<ConfidenceLevel>,
    ) -> Result<RunEvaluation, EvalError> {
        let results = self.matcher.match_calls(expected, actual, strategy, lookup)?;
        let classification = classify_run(&results);
        let parameter_score = average_parameter_score(&results);
        let confidence = self.analyzer.analyze(confidence, classification.is_correct());

        Ok(RunEvaluation {
            metadata: ReportMetadata::default(),
            strategy,
            results,
            classification,
            parameter_score,
            confidence,
            confidence_level,
            confidence_description: ConfidenceDescription::derive(confidence_level, parameter_score),
        })
    }
}
