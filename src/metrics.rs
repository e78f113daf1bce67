//! Aggregate metrics over evaluated runs and tool calls.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceDescription;
use crate::matcher::{Classification, MatchResult};

/// Converts a count to f64 for statistical calculations.
///
/// Counts above `u32::MAX` saturate; evaluation datasets never get there.
#[inline]
pub(crate) fn count_as_f64(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

/// `numerator / denominator`, or `0.0` when the denominator is zero.
#[inline]
pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        count_as_f64(numerator) / count_as_f64(denominator)
    }
}

/// Computes mean of values.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / count_as_f64(values.len())
}

/// Precision/Recall/F1 metrics over classification counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecallMetrics {
    /// Precision: TP / (TP + FP).
    pub precision: f64,
    /// Recall: TP / (TP + FN).
    pub recall: f64,
    /// F1 score: harmonic mean of precision and recall.
    pub f1: f64,
    /// Expected calls that were made.
    pub true_positives: usize,
    /// Calls made that nothing expected.
    pub false_positives: usize,
    /// Expected calls that were not made.
    pub false_negatives: usize,
}

impl PrecisionRecallMetrics {
    /// Creates metrics from raw counts. Zero denominators give `0.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tool_eval::PrecisionRecallMetrics;
    ///
    /// let metrics = PrecisionRecallMetrics::from_counts(2, 2, 2);
    /// // Precision = 2/4 = 0.5
    /// // Recall = 2/4 = 0.5
    /// assert!((metrics.precision - 0.5).abs() < f64::EPSILON);
    /// assert!((metrics.f1 - 0.5).abs() < f64::EPSILON);
    /// ```
    #[must_use]
    pub fn from_counts(
        true_positives: usize,
        false_positives: usize,
        false_negatives: usize,
    ) -> Self {
        let precision = ratio(true_positives, true_positives + false_positives);
        let recall = ratio(true_positives, true_positives + false_negatives);

        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            precision,
            recall,
            f1,
            true_positives,
            false_positives,
            false_negatives,
        }
    }
}

/// One persisted evaluation run, as the metrics service consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run identifier.
    pub id: String,
    /// Overall run classification, if the run finished.
    pub classification: Option<Classification>,
    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: Option<u64>,
    /// Persisted confidence description (see [`ConfidenceDescription`]).
    pub confidence_description: Option<String>,
    /// Average parameter score of the run (0-10).
    pub parameter_correctness: Option<f64>,
}

impl RunRecord {
    /// Creates a record with only an id and a classification.
    #[must_use]
    pub fn new(id: impl Into<String>, classification: Option<Classification>) -> Self {
        Self {
            id: id.into(),
            classification,
            execution_time_ms: None,
            confidence_description: None,
            parameter_correctness: None,
        }
    }

    /// Sets the execution time.
    #[must_use]
    pub const fn with_execution_time_ms(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    /// Sets the parameter score.
    #[must_use]
    pub const fn with_parameter_correctness(mut self, score: f64) -> Self {
        self.parameter_correctness = Some(score);
        self
    }

    /// Sets the persisted confidence description.
    #[must_use]
    pub fn with_confidence_description(mut self, description: impl Into<String>) -> Self {
        self.confidence_description = Some(description.into());
        self
    }
}

/// One matched tool call, tagged with the run it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Run the call belongs to.
    pub run_id: String,
    /// Classification of the call.
    pub classification: Classification,
    /// Parameter score of the call (0-10).
    pub parameter_correctness: Option<f64>,
}

impl ToolCallRecord {
    /// Builds a record from matcher output.
    #[must_use]
    pub fn from_match(run_id: impl Into<String>, result: &MatchResult) -> Self {
        Self {
            run_id: run_id.into(),
            classification: result.classification,
            parameter_correctness: result.parameter_score,
        }
    }
}

/// Tally of persisted confidence descriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceCategoryCounts {
    /// Runs described as robust.
    pub robust: usize,
    /// Runs that need clarity.
    pub needs_clarity: usize,
    /// Runs described as misleading.
    pub misleading: usize,
}

impl ConfidenceCategoryCounts {
    fn record(&mut self, description: &str) {
        match ConfidenceDescription::from_persisted(description) {
            Some(ConfidenceDescription::Robust) => self.robust += 1,
            Some(ConfidenceDescription::NeedsClarity) => self.needs_clarity += 1,
            Some(ConfidenceDescription::Misleading) => self.misleading += 1,
            None => {}
        }
    }
}

/// Aggregate metrics over a set of runs or tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Records summarized.
    pub total: usize,
    /// `TP` count.
    pub true_positives: usize,
    /// `FP` count.
    pub false_positives: usize,
    /// `TN` count.
    pub true_negatives: usize,
    /// `FN` count.
    pub false_negatives: usize,
    /// TP / (TP + FP).
    pub precision: f64,
    /// TP / (TP + FN).
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Mean parameter score of `TP` records (0-10).
    pub parameter_accuracy: f64,
    /// Total execution time divided by total runs.
    pub avg_execution_time_ms: f64,
    /// Tally of confidence descriptions.
    pub confidence_category_counts: ConfidenceCategoryCounts,
    /// Ids of the summarized runs.
    pub contributing_run_ids: Vec<String>,
}

impl MetricsSummary {
    /// Returns the precision/recall view of this summary.
    #[must_use]
    pub const fn precision_recall(&self) -> PrecisionRecallMetrics {
        PrecisionRecallMetrics {
            precision: self.precision,
            recall: self.recall,
            f1: self.f1,
            true_positives: self.true_positives,
            false_positives: self.false_positives,
            false_negatives: self.false_negatives,
        }
    }
}

#[derive(Default)]
struct Counts {
    tp: usize,
    fp: usize,
    tn: usize,
    fn_: usize,
}

impl Counts {
    fn record(&mut self, classification: Classification) {
        match classification {
            Classification::TruePositive => self.tp += 1,
            Classification::FalsePositive => self.fp += 1,
            Classification::TrueNegative => self.tn += 1,
            Classification::FalseNegative => self.fn_ += 1,
        }
    }
}

/// Computes fleet-wide metrics from evaluation records.
///
/// Stateless. Every rate is `0.0` when its denominator is zero, so a summary
/// never contains `NaN`.
///
/// # Examples
///
/// ```
/// use tool_eval::{Classification, MetricsService, RunRecord};
///
/// let runs = vec![
///     RunRecord::new("r1", Some(Classification::TruePositive)).with_parameter_correctness(10.0),
///     RunRecord::new("r2", Some(Classification::FalsePositive)),
/// ];
///
/// let summary = MetricsService::new().summarize(&runs);
/// assert_eq!(summary.total, 2);
/// assert!((summary.precision - 0.5).abs() < f64::EPSILON);
/// assert!((summary.parameter_accuracy - 10.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsService;

impl MetricsService {
    /// Creates a metrics service.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Summarizes runs in a single pass.
    ///
    /// Parameter accuracy averages the non-null scores of `TP` runs only, so
    /// a partially matched `FN` or `FP` run adds nothing to it.
    /// Runs without a classification still count toward `total` and the
    /// execution-time average.
    #[must_use]
    pub fn summarize(&self, runs: &[RunRecord]) -> MetricsSummary {
        let mut counts = Counts::default();
        let mut total_time_ms: u64 = 0;
        let mut confidence = ConfidenceCategoryCounts::default();
        let mut scores = Vec::new();
        let mut ids = Vec::with_capacity(runs.len());

        for run in runs {
            if let Some(classification) = run.classification {
                counts.record(classification);
                if classification == Classification::TruePositive {
                    scores.extend(run.parameter_correctness);
                }
            }
            if let Some(ms) = run.execution_time_ms {
                total_time_ms = total_time_ms.saturating_add(ms);
            }
            if let Some(description) = &run.confidence_description {
                confidence.record(description);
            }
            ids.push(run.id.clone());
        }

        #[allow(clippy::cast_precision_loss)]
        let avg_execution_time_ms = if runs.is_empty() {
            0.0
        } else {
            total_time_ms as f64 / count_as_f64(runs.len())
        };

        build_summary(runs.len(), &counts, &scores, avg_execution_time_ms, confidence, ids)
    }

    /// Summarizes individual tool calls rather than whole runs.
    ///
    /// Execution time and confidence counts are zero; contributing run ids
    /// are distinct, in first-seen order.
    #[must_use]
    pub fn summarize_tool_calls(&self, records: &[ToolCallRecord]) -> MetricsSummary {
        let mut counts = Counts::default();
        let mut scores = Vec::new();
        let mut seen = HashSet::new();
        let mut ids = Vec::new();

        for record in records {
            counts.record(record.classification);
            if record.classification == Classification::TruePositive {
                scores.extend(record.parameter_correctness);
            }
            if seen.insert(record.run_id.as_str()) {
                ids.push(record.run_id.clone());
            }
        }

        build_summary(
            records.len(),
            &counts,
            &scores,
            0.0,
            ConfidenceCategoryCounts::default(),
            ids,
        )
    }
}

fn build_summary(
    total: usize,
    counts: &Counts,
    scores: &[f64],
    avg_execution_time_ms: f64,
    confidence_category_counts: ConfidenceCategoryCounts,
    contributing_run_ids: Vec<String>,
) -> MetricsSummary {
    let rates = PrecisionRecallMetrics::from_counts(counts.tp, counts.fp, counts.fn_);
    let summary = MetricsSummary {
        total,
        true_positives: counts.tp,
        false_positives: counts.fp,
        true_negatives: counts.tn,
        false_negatives: counts.fn_,
        precision: rates.precision,
        recall: rates.recall,
        f1: rates.f1,
        parameter_accuracy: mean(scores),
        avg_execution_time_ms,
        confidence_category_counts,
        contributing_run_ids,
    };
    tracing::debug!(
        total,
        precision = summary.precision,
        recall = summary.recall,
        f1 = summary.f1,
        "Summarized evaluation metrics"
    );
    summary
}
