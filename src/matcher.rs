//! Reconciliation of expected tool calls against the calls a model made.
//!
//! Every expected call ends as either `TP` or `FN`, every actual call not
//! consumed by a `TP` ends as `FP`, and the degenerate case of nothing
//! expected and nothing called yields a single synthetic `TN`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_PARAMETER_SCORE, NO_PARAMETERS_EXPECTED, NO_PARAMETERS_PROVIDED, NOT_CALLED_JUSTIFICATION,
    PARAMETER_COMPONENT_WEIGHT, PERFECT_PARAMETER_MATCH,
};
use crate::error::InvalidInputError;
use crate::metrics::{mean, ratio};
use crate::schema::ToolParameterSchema;
use crate::tool_call::{ActualToolCall, ExpectedToolCall, Parameters};
use crate::validator::{ParameterValidationResult, ParameterValidator};
use crate::value::{types_match, values_match};

/// Classification of one tool-call decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// The expected tool was called.
    #[serde(rename = "TP")]
    TruePositive,
    /// A tool was called that nothing expected.
    #[serde(rename = "FP")]
    FalsePositive,
    /// Nothing was expected and nothing was called.
    #[serde(rename = "TN")]
    TrueNegative,
    /// The expected tool was not called.
    #[serde(rename = "FN")]
    FalseNegative,
}

impl Classification {
    /// Returns the two-letter code (`TP`, `FP`, `TN`, `FN`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TruePositive => "TP",
            Self::FalsePositive => "FP",
            Self::TrueNegative => "TN",
            Self::FalseNegative => "FN",
        }
    }

    /// Parses a two-letter code. Anything else yields `None`.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "TP" => Some(Self::TruePositive),
            "FP" => Some(Self::FalsePositive),
            "TN" => Some(Self::TrueNegative),
            "FN" => Some(Self::FalseNegative),
            _ => None,
        }
    }

    /// Returns true for `TP` and `TN`.
    #[must_use]
    pub const fn is_correct(self) -> bool {
        matches!(self, Self::TruePositive | Self::TrueNegative)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How expected and actual calls are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Greedy first-fit by tool name, ignoring position.
    OrderIndependent,
    /// Position-by-position comparison.
    OrderDependent,
}

impl MatchStrategy {
    /// Picks the strategy from a test case's `order_dependent` flag.
    #[must_use]
    pub const fn from_order_dependent(order_dependent: bool) -> Self {
        if order_dependent {
            Self::OrderDependent
        } else {
            Self::OrderIndependent
        }
    }
}

/// Outcome for one call taking part in a matching pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Position of the expected call, absent for `FP` and `TN`.
    pub expected_index: Option<usize>,
    /// Position of the actual call, absent for `FN` and `TN`.
    pub actual_index: Option<usize>,
    /// Classification of this call.
    pub classification: Classification,
    /// Parameter score (0-10): scored on `TP`, `0.0` on `FN`, absent otherwise.
    pub parameter_score: Option<f64>,
    /// Explanation of the score or of the miss.
    pub justification: Option<String>,
    /// The expected call involved, if any.
    pub expected_call: Option<ExpectedToolCall>,
    /// The actual call involved, if any.
    pub actual_call: Option<ActualToolCall>,
    /// Schema-based validation of a `TP` pair.
    pub validation: Option<ParameterValidationResult>,
}

impl MatchResult {
    fn true_negative() -> Self {
        Self {
            expected_index: None,
            actual_index: None,
            classification: Classification::TrueNegative,
            parameter_score: None,
            justification: None,
            expected_call: None,
            actual_call: None,
            validation: None,
        }
    }

    fn false_negative(index: usize, expected: &ExpectedToolCall, justification: String) -> Self {
        Self {
            expected_index: Some(index),
            actual_index: None,
            classification: Classification::FalseNegative,
            parameter_score: Some(0.0),
            justification: Some(justification),
            expected_call: Some(expected.clone()),
            actual_call: None,
            validation: None,
        }
    }

    fn false_positive(index: usize, actual: &ActualToolCall) -> Self {
        Self {
            expected_index: None,
            actual_index: Some(index),
            classification: Classification::FalsePositive,
            parameter_score: None,
            justification: None,
            expected_call: None,
            actual_call: Some(actual.clone()),
            validation: None,
        }
    }

    fn true_positive<L: SchemaLookup + ?Sized>(
        expected_index: usize,
        expected: &ExpectedToolCall,
        actual_index: usize,
        actual: &ActualToolCall,
        lookup: &L,
    ) -> Result<Self, InvalidInputError> {
        let schema = lookup.schema_for(expected.tool_name())?;
        let validation = ParameterValidator::new().validate(
            &schema,
            expected.parameters(),
            Some(actual.parameters()),
        );
        let ParameterScore {
            score,
            justification,
        } = score_parameters(expected.parameters(), Some(actual.parameters()));

        Ok(Self {
            expected_index: Some(expected_index),
            actual_index: Some(actual_index),
            classification: Classification::TruePositive,
            parameter_score: Some(score),
            justification: Some(justification),
            expected_call: Some(expected.clone()),
            actual_call: Some(actual.clone()),
            validation: Some(validation),
        })
    }
}

/// Source of resolved parameter schemas, keyed by tool name.
///
/// Implemented for closures and for maps of tool name to schema.
pub trait SchemaLookup {
    /// Returns the schema of `tool_name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputError::SchemaLookup` when the schema cannot be
    /// produced. The matcher propagates the error unchanged.
    fn schema_for(&self, tool_name: &str) -> Result<ToolParameterSchema, InvalidInputError>;
}

impl<F> SchemaLookup for F
where
    F: Fn(&str) -> Result<ToolParameterSchema, InvalidInputError>,
{
    fn schema_for(&self, tool_name: &str) -> Result<ToolParameterSchema, InvalidInputError> {
        self(tool_name)
    }
}

/// Unknown tools resolve to the empty schema.
impl SchemaLookup for HashMap<String, ToolParameterSchema> {
    fn schema_for(&self, tool_name: &str) -> Result<ToolParameterSchema, InvalidInputError> {
        Ok(self.get(tool_name).cloned().unwrap_or_default())
    }
}

/// A lookup that knows no schemas; every tool gets the empty schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchemas;

impl SchemaLookup for NoSchemas {
    fn schema_for(&self, _tool_name: &str) -> Result<ToolParameterSchema, InvalidInputError> {
        Ok(ToolParameterSchema::default())
    }
}

/// A 0-10 parameter score with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterScore {
    /// Score in `[0, 10]`.
    pub score: f64,
    /// Failing aspects joined by `"; "`, or a fixed message.
    pub justification: String,
}

/// Matches expected calls against actual calls.
///
/// Stateless; a fresh result list is built on every call.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval::{
///     ActualToolCall, Classification, ExpectedToolCall, MatchStrategy, NoSchemas, ToolCallMatcher,
/// };
///
/// let expected = vec![ExpectedToolCall::new("srv", "search").with_parameter("q", json!("rust"))];
/// let actual = vec![ActualToolCall::new("search").with_parameter("q", json!("Rust"))];
///
/// let results = ToolCallMatcher::new()
///     .match_calls(&expected, &actual, MatchStrategy::OrderIndependent, &NoSchemas)
///     .unwrap();
///
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].classification, Classification::TruePositive);
/// assert_eq!(results[0].parameter_score, Some(10.0));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolCallMatcher;

impl ToolCallMatcher {
    /// Creates a matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Matches with the given strategy.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputError` if `lookup` fails for a matched tool.
    pub fn match_calls<L: SchemaLookup + ?Sized>(
        &self,
        expected: &[ExpectedToolCall],
        actual: &[ActualToolCall],
        strategy: MatchStrategy,
        lookup: &L,
    ) -> Result<Vec<MatchResult>, InvalidInputError> {
        let results = match strategy {
            MatchStrategy::OrderIndependent => self.match_order_independent(expected, actual, lookup),
            MatchStrategy::OrderDependent => self.match_order_dependent(expected, actual, lookup),
        }?;

        tracing::debug!(
            ?strategy,
            expected = expected.len(),
            actual = actual.len(),
            true_positives = count(&results, Classification::TruePositive),
            false_positives = count(&results, Classification::FalsePositive),
            false_negatives = count(&results, Classification::FalseNegative),
            "Matched tool calls"
        );
        Ok(results)
    }

    /// Greedy best-fit matching that ignores call order.
    ///
    /// Each expected call, in order, takes the first unconsumed actual call
    /// with the same tool name. The expected server identifier is not
    /// compared. Leftover actual calls become `FP`s after all `TP`/`FN`s.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputError` if `lookup` fails for a matched tool.
    pub fn match_order_independent<L: SchemaLookup + ?Sized>(
        &self,
        expected: &[ExpectedToolCall],
        actual: &[ActualToolCall],
        lookup: &L,
    ) -> Result<Vec<MatchResult>, InvalidInputError> {
        if expected.is_empty() && actual.is_empty() {
            return Ok(vec![MatchResult::true_negative()]);
        }

        let mut results = Vec::with_capacity(expected.len() + actual.len());
        let mut consumed = vec![false; actual.len()];

        for (expected_index, expected_call) in expected.iter().enumerate() {
            let found = actual.iter().enumerate().position(|(i, call)| {
                !consumed[i] && call.tool_name() == expected_call.tool_name()
            });

            match found {
                Some(actual_index) => {
                    consumed[actual_index] = true;
                    results.push(MatchResult::true_positive(
                        expected_index,
                        expected_call,
                        actual_index,
                        &actual[actual_index],
                        lookup,
                    )?);
                }
                None => results.push(MatchResult::false_negative(
                    expected_index,
                    expected_call,
                    NOT_CALLED_JUSTIFICATION.to_string(),
                )),
            }
        }

        results.extend(
            actual
                .iter()
                .enumerate()
                .filter(|(i, _)| !consumed[*i])
                .map(|(i, call)| MatchResult::false_positive(i, call)),
        );

        Ok(results)
    }

    /// Positional matching.
    ///
    /// At each position: equal names give a `TP`; differing names give an
    /// `FN` for the expected call followed by an `FP` for the actual call;
    /// a lone expected call is an `FN` and a lone actual call an `FP`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputError` if `lookup` fails for a matched tool.
    pub fn match_order_dependent<L: SchemaLookup + ?Sized>(
        &self,
        expected: &[ExpectedToolCall],
        actual: &[ActualToolCall],
        lookup: &L,
    ) -> Result<Vec<MatchResult>, InvalidInputError> {
        let positions = expected.len().max(actual.len());
        if positions == 0 {
            return Ok(vec![MatchResult::true_negative()]);
        }

        let mut results = Vec::with_capacity(expected.len() + actual.len());
        for i in 0..positions {
            match (expected.get(i), actual.get(i)) {
                (Some(e), Some(a)) if e.tool_name() == a.tool_name() => {
                    results.push(MatchResult::true_positive(i, e, i, a, lookup)?);
                }
                (Some(e), Some(a)) => {
                    results.push(MatchResult::false_negative(i, e, not_called_at(i)));
                    results.push(MatchResult::false_positive(i, a));
                }
                (Some(e), None) => {
                    results.push(MatchResult::false_negative(i, e, not_called_at(i)));
                }
                (None, Some(a)) => results.push(MatchResult::false_positive(i, a)),
                (None, None) => {}
            }
        }

        Ok(results)
    }
}

fn not_called_at(position: usize) -> String {
    format!("Expected tool not called at position {position}")
}

fn count(results: &[MatchResult], classification: Classification) -> usize {
    results
        .iter()
        .filter(|r| r.classification == classification)
        .count()
}

/// Scores how well `actual` parameters match `expected` ones, from 0 to 10.
///
/// Four components of 2.5 points each, computed over the expected keys:
///
/// | Component | Points |
/// |-----------|--------|
/// | Completeness: expected keys present | 2.5 × fraction |
/// | Correctness: values equal after normalization | 2.5 × fraction |
/// | Type conformance: same runtime type, or both numeric | 2.5 × fraction |
/// | No extra keys beyond the expected ones | 2.5 or 0 |
///
/// Nothing expected earns the full score; something expected but nothing
/// supplied earns zero.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval::score_parameters;
///
/// let expected = json!({"a": 1});
/// let actual = json!({"a": 1, "extra": "z"});
/// let scored = score_parameters(expected.as_object(), actual.as_object());
///
/// assert!((scored.score - 7.5).abs() < f64::EPSILON);
/// assert_eq!(scored.justification, "Extra params: {extra}");
/// ```
#[must_use]
pub fn score_parameters(expected: Option<&Parameters>, actual: Option<&Parameters>) -> ParameterScore {
    let Some(expected) = expected.filter(|p| !p.is_empty()) else {
        return ParameterScore {
            score: MAX_PARAMETER_SCORE,
            justification: NO_PARAMETERS_EXPECTED.to_string(),
        };
    };
    let Some(actual) = actual.filter(|p| !p.is_empty()) else {
        return ParameterScore {
            score: 0.0,
            justification: NO_PARAMETERS_PROVIDED.to_string(),
        };
    };

    let total = expected.len();
    let mut missing = Vec::new();
    let mut correct = 0;
    let mut conforming = 0;

    for (name, expected_value) in expected {
        let Some(actual_value) = actual.get(name) else {
            missing.push(name.as_str());
            continue;
        };
        if values_match(expected_value, Some(actual_value)) {
            correct += 1;
        }
        if types_match(actual_value, expected_value) {
            conforming += 1;
        }
    }
    let present = total - missing.len();
    let extra: Vec<&str> = actual
        .keys()
        .filter(|name| !expected.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();

    let mut score = PARAMETER_COMPONENT_WEIGHT * ratio(present, total)
        + PARAMETER_COMPONENT_WEIGHT * ratio(correct, total)
        + PARAMETER_COMPONENT_WEIGHT * ratio(conforming, total);
    if extra.is_empty() {
        score += PARAMETER_COMPONENT_WEIGHT;
    }

    let mut failures = Vec::new();
    if !missing.is_empty() {
        failures.push(format!("Missing params: {{{}}}", missing.join(", ")));
    }
    if correct < total {
        failures.push(format!("Incorrect values: {}/{total}", total - correct));
    }
    if conforming < total {
        failures.push(format!("Type mismatches: {}/{total}", total - conforming));
    }
    if !extra.is_empty() {
        failures.push(format!("Extra params: {{{}}}", extra.join(", ")));
    }

    let justification = if failures.is_empty() {
        PERFECT_PARAMETER_MATCH.to_string()
    } else {
        failures.join("; ")
    };

    ParameterScore {
        score: score.clamp(0.0, MAX_PARAMETER_SCORE),
        justification,
    }
}

/// Aggregates one run's per-call results into a single classification.
///
/// Precedence: all `TN` → `TN`; all `TP` → `TP`; any `FN` → `FN`; any
/// `FP` → `FP`; any other mixture → `TP`. An empty slice is `TN`.
#[must_use]
pub fn classify_run(results: &[MatchResult]) -> Classification {
    let all = |c: Classification| results.iter().all(|r| r.classification == c);
    let any = |c: Classification| results.iter().any(|r| r.classification == c);

    if all(Classification::TrueNegative) {
        Classification::TrueNegative
    } else if all(Classification::TruePositive) {
        Classification::TruePositive
    } else if any(Classification::FalseNegative) {
        Classification::FalseNegative
    } else if any(Classification::FalsePositive) {
        Classification::FalsePositive
    } else {
        Classification::TruePositive
    }
}

/// Mean parameter score over the `TP` results only.
///
/// Returns `None` when there is no scored `TP`.
#[must_use]
pub fn average_parameter_score(results: &[MatchResult]) -> Option<f64> {
    let scores: Vec<f64> = results
        .iter()
        .filter(|r| r.classification == Classification::TruePositive)
        .filter_map(|r| r.parameter_score)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(mean(&scores))
    }
}
