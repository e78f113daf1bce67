//! Confidence categorization of tool selections.
//!
//! Combines a model's self-reported confidence with whether its selection
//! was actually correct:
//!
//! | Confidence | Correct | Category |
//! |------------|---------|----------|
//! | high (≥ 0.7) | yes | `robust` |
//! | medium or low | yes | `needs_clarity` |
//! | high | no | `misleading` |
//! | medium or low | no | `needs_clarity` |
//! | unavailable | either | none |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::constants::{
    MAX_PARAMETER_SCORE, MISLEADING_DESCRIPTION, NEEDS_CLARITY_DESCRIPTION, ROBUST_DESCRIPTION,
};

/// Qualitative bucket for a (confidence, correctness) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceCategory {
    /// Confident and correct: the tool description works.
    Robust,
    /// Correct but unsure, or wrong without strong conviction.
    NeedsClarity,
    /// Confident and wrong: the description leads the model astray.
    Misleading,
}

impl ConfidenceCategory {
    /// Returns the snake-case name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Robust => "robust",
            Self::NeedsClarity => "needs_clarity",
            Self::Misleading => "misleading",
        }
    }
}

impl fmt::Display for ConfidenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a confidence analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceAnalysis {
    /// Confidence the model reported, if any.
    pub confidence_score: Option<f64>,
    /// Whether the selection was correct.
    pub selection_correct: bool,
    /// Category, absent when no confidence was reported.
    pub category: Option<ConfidenceCategory>,
    /// Human-readable remediation guidance.
    pub recommendations: Vec<String>,
}

impl ConfidenceAnalysis {
    /// Returns true when the tool description is misleading.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.category == Some(ConfidenceCategory::Misleading)
    }
}

/// Buckets confidence scores against configured thresholds.
///
/// # Examples
///
/// ```
/// use tool_eval::{ConfidenceAnalyzer, ConfidenceCategory};
///
/// let analyzer = ConfidenceAnalyzer::default();
///
/// let analysis = analyzer.analyze(Some(0.9), false);
/// assert_eq!(analysis.category, Some(ConfidenceCategory::Misleading));
/// assert!(analysis.recommendations[0].starts_with("CRITICAL:"));
///
/// assert_eq!(analyzer.analyze(None, true).category, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceAnalyzer {
    high_threshold: f64,
    low_threshold: f64,
}

impl Default for ConfidenceAnalyzer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ConfidenceAnalyzer {
    /// Creates an analyzer using the thresholds in `config`.
    #[must_use]
    pub const fn new(config: &EngineConfig) -> Self {
        Self {
            high_threshold: config.high_confidence_threshold,
            low_threshold: config.low_confidence_threshold,
        }
    }

    /// Categorizes a confidence score against selection correctness.
    ///
    /// Never fails; a missing score yields no category.
    #[must_use]
    pub fn analyze(&self, confidence: Option<f64>, selection_correct: bool) -> ConfidenceAnalysis {
        let Some(score) = confidence else {
            tracing::debug!(selection_correct, "Confidence score unavailable");
            return ConfidenceAnalysis {
                confidence_score: None,
                selection_correct,
                category: None,
                recommendations: vec![unavailable_recommendation(selection_correct)],
            };
        };

        let category = self.categorize(score, selection_correct);
        tracing::info!(
            score,
            selection_correct,
            category = %category,
            "Analyzed selection confidence"
        );

        ConfidenceAnalysis {
            confidence_score: Some(score),
            selection_correct,
            category: Some(category),
            recommendations: vec![recommendation(category, score, selection_correct)],
        }
    }

    fn categorize(&self, score: f64, selection_correct: bool) -> ConfidenceCategory {
        let high = score >= self.high_threshold;
        match (high, selection_correct) {
            (true, true) => ConfidenceCategory::Robust,
            (true, false) => ConfidenceCategory::Misleading,
            (false, _) => ConfidenceCategory::NeedsClarity,
        }
    }

    /// Returns true if `score` falls below the low threshold.
    #[must_use]
    pub fn is_low(&self, score: f64) -> bool {
        score < self.low_threshold
    }
}

fn recommendation(category: ConfidenceCategory, score: f64, selection_correct: bool) -> String {
    match category {
        ConfidenceCategory::Robust => {
            format!("Tool description is clear and effective (confidence: {score:.2})")
        }
        ConfidenceCategory::NeedsClarity if selection_correct => format!(
            "Tool works but confidence is low ({score:.2}). \
             Consider adding more examples or clarifying the description."
        ),
        ConfidenceCategory::NeedsClarity => format!(
            "Wrong tool selected with medium confidence ({score:.2}). \
             Review tool description for ambiguity."
        ),
        ConfidenceCategory::Misleading => format!(
            "CRITICAL: Wrong tool selected with high confidence ({score:.2}). \
             Tool description is likely misleading; review and rewrite it."
        ),
    }
}

fn unavailable_recommendation(selection_correct: bool) -> String {
    if selection_correct {
        "Correct tool selected (confidence score not available)".to_string()
    } else {
        "Wrong tool selected. Consider reviewing tool description clarity \
         (confidence score not available)."
            .to_string()
    }
}

/// Confidence a model states about its own tool choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// The model is sure of its choice.
    High,
    /// The model is unsure of its choice.
    Low,
}

/// Persisted description of a run's confidence outcome.
///
/// Stored as one of the literals `"robust description"`, `"needs clarity"`
/// and `"misleading description"`, which the metrics service tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceDescription {
    /// High confidence with a perfect parameter score.
    #[serde(rename = "robust description")]
    Robust,
    /// Any other scored outcome.
    #[serde(rename = "needs clarity")]
    NeedsClarity,
    /// High confidence with a zero parameter score.
    #[serde(rename = "misleading description")]
    Misleading,
}

impl ConfidenceDescription {
    /// Derives the description from a stated level and a parameter score.
    ///
    /// Returns `None` when either input is missing.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn derive(level: Option<ConfidenceLevel>, parameter_score: Option<f64>) -> Option<Self> {
        let (level, score) = (level?, parameter_score?);
        Some(match level {
            ConfidenceLevel::High if score == MAX_PARAMETER_SCORE => Self::Robust,
            ConfidenceLevel::High if score == 0.0 => Self::Misleading,
            _ => Self::NeedsClarity,
        })
    }

    /// Parses a persisted literal. Matching is exact.
    #[must_use]
    pub fn from_persisted(description: &str) -> Option<Self> {
        match description {
            ROBUST_DESCRIPTION => Some(Self::Robust),
            NEEDS_CLARITY_DESCRIPTION => Some(Self::NeedsClarity),
            MISLEADING_DESCRIPTION => Some(Self::Misleading),
            _ => None,
        }
    }

    /// Returns the persisted literal.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Robust => ROBUST_DESCRIPTION,
            Self::NeedsClarity => NEEDS_CLARITY_DESCRIPTION,
            Self::Misleading => MISLEADING_DESCRIPTION,
        }
    }
}

impl fmt::Display for ConfidenceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(confidence: f64, correct: bool) -> Option<ConfidenceCategory> {
        ConfidenceAnalyzer::default()
            .analyze(Some(confidence), correct)
            .category
    }

    #[test]
    fn category_table() {
        assert_eq!(category(0.9, true), Some(ConfidenceCategory::Robust));
        assert_eq!(category(0.7, true), Some(ConfidenceCategory::Robust));
        assert_eq!(category(0.9, false), Some(ConfidenceCategory::Misleading));
        assert_eq!(category(0.2, true), Some(ConfidenceCategory::NeedsClarity));
        assert_eq!(category(0.5, true), Some(ConfidenceCategory::NeedsClarity));
        assert_eq!(category(0.5, false), Some(ConfidenceCategory::NeedsClarity));
        assert_eq!(category(0.1, false), Some(ConfidenceCategory::NeedsClarity));
    }

    #[test]
    fn missing_confidence_has_no_category() {
        let analyzer = ConfidenceAnalyzer::default();

        let correct = analyzer.analyze(None, true);
        assert_eq!(correct.category, None);
        assert_eq!(correct.confidence_score, None);
        assert!(correct.recommendations[0].contains("not available"));

        let wrong = analyzer.analyze(None, false);
        assert!(wrong.recommendations[0].starts_with("Wrong tool selected"));
        assert!(!wrong.is_critical());
    }

    #[test]
    fn recommendations_format_two_decimals() {
        let analysis = ConfidenceAnalyzer::default().analyze(Some(0.91234), true);
        assert_eq!(
            analysis.recommendations,
            vec!["Tool description is clear and effective (confidence: 0.91)".to_string()]
        );
    }

    #[test]
    fn only_misleading_is_critical() {
        let analyzer = ConfidenceAnalyzer::default();
        let misleading = analyzer.analyze(Some(0.95), false);
        assert!(misleading.is_critical());
        assert!(misleading.recommendations[0].starts_with("CRITICAL:"));

        for (score, correct) in [(0.95, true), (0.3, true), (0.5, false)] {
            let analysis = analyzer.analyze(Some(score), correct);
            assert!(!analysis.is_critical());
            assert!(!analysis.recommendations[0].contains("CRITICAL"));
        }
    }

    #[test]
    fn thresholds_follow_config() {
        let config = EngineConfig::new().with_confidence_thresholds(0.2, 0.95);
        let analyzer = ConfidenceAnalyzer::new(&config);

        assert_eq!(
            analyzer.analyze(Some(0.9), false).category,
            Some(ConfidenceCategory::NeedsClarity)
        );
        assert!(analyzer.is_low(0.1));
        assert!(!analyzer.is_low(0.3));
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&ConfidenceCategory::NeedsClarity).unwrap();
        assert_eq!(json, "\"needs_clarity\"");
    }

    #[test]
    fn description_derivation() {
        use ConfidenceLevel::{High, Low};

        assert_eq!(
            ConfidenceDescription::derive(Some(High), Some(10.0)),
            Some(ConfidenceDescription::Robust)
        );
        assert_eq!(
            ConfidenceDescription::derive(Some(High), Some(0.0)),
            Some(ConfidenceDescription::Misleading)
        );
        assert_eq!(
            ConfidenceDescription::derive(Some(High), Some(7.5)),
            Some(ConfidenceDescription::NeedsClarity)
        );
        assert_eq!(
            ConfidenceDescription::derive(Some(Low), Some(10.0)),
            Some(ConfidenceDescription::NeedsClarity)
        );
        assert_eq!(ConfidenceDescription::derive(None, Some(10.0)), None);
        assert_eq!(ConfidenceDescription::derive(Some(High), None), None);
    }

    #[test]
    fn description_persisted_literals() {
        for description in [
            ConfidenceDescription::Robust,
            ConfidenceDescription::NeedsClarity,
            ConfidenceDescription::Misleading,
        ] {
            assert_eq!(
                ConfidenceDescription::from_persisted(description.as_str()),
                Some(description)
            );
            assert_eq!(
                serde_json::to_value(description).unwrap(),
                serde_json::Value::String(description.to_string())
            );
        }
        assert_eq!(ConfidenceDescription::from_persisted("robust"), None);
    }
}
