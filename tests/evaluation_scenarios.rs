//! End-to-end evaluation scenarios.
//!
//! Each test walks a realistic run from raw expectations and model calls
//! through matching, confidence analysis and fleet metrics.

use std::collections::HashMap;

use serde_json::json;

use tool_eval::{
    ActualToolCall, Classification, ConfidenceCategory, ConfidenceLevel, EngineConfig,
    ExpectedToolCall, InvalidInputError, MatchStrategy, MetricsService, NoSchemas,
    ParameterValidator, RunEvaluator, RunRecord, SchemaCache, ToolCallMatcher,
    ToolParameterSchema, classify_run,
};

fn weather_schema_document() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "location": {"$ref": "#/$defs/Location"},
            "days": {"type": "integer", "description": "Forecast length"},
            "units": {"type": ["string", "null"]}
        },
        "required": ["location"],
        "$defs": {
            "Location": {
                "type": "object",
                "description": "Where to forecast",
                "properties": {
                    "city": {"type": "string", "description": "City name"}
                }
            }
        }
    })
}

#[test]
fn reordered_calls_depend_on_strategy() {
    let expected = vec![
        ExpectedToolCall::new("files", "read_file").with_parameter("path", json!("a.txt")),
        ExpectedToolCall::new("files", "write_file").with_parameter("path", json!("b.txt")),
    ];
    let actual = vec![
        ActualToolCall::new("write_file").with_parameter("path", json!("b.txt")),
        ActualToolCall::new("read_file").with_parameter("path", json!("A.TXT")),
    ];
    let matcher = ToolCallMatcher::new();

    let free = matcher
        .match_calls(&expected, &actual, MatchStrategy::OrderIndependent, &NoSchemas)
        .unwrap();
    assert_eq!(classify_run(&free), Classification::TruePositive);

    let strict = matcher
        .match_calls(&expected, &actual, MatchStrategy::OrderDependent, &NoSchemas)
        .unwrap();
    assert_eq!(classify_run(&strict), Classification::FalseNegative);
    assert_eq!(strict.len(), 4);
}

#[test]
fn wrong_tool_doubles_under_both_strategies() {
    let expected = [ExpectedToolCall::new("srv", "A")];
    let actual = [ActualToolCall::new("B")];

    for strategy in [MatchStrategy::OrderIndependent, MatchStrategy::OrderDependent] {
        let results = ToolCallMatcher::new()
            .match_calls(&expected, &actual, strategy, &NoSchemas)
            .unwrap();
        let classes: Vec<Classification> = results.iter().map(|r| r.classification).collect();
        assert_eq!(
            classes,
            vec![Classification::FalseNegative, Classification::FalsePositive]
        );
    }
}

#[test]
fn schema_map_lookup_feeds_validation() {
    let cache = SchemaCache::default();
    let schema = cache.resolve(&weather_schema_document()).unwrap();
    let mut schemas = HashMap::new();
    schemas.insert("forecast".to_string(), schema);

    let expected = [ExpectedToolCall::new("weather", "forecast")
        .with_parameter("location", json!({"city": "Oslo"}))
        .with_parameter("days", json!(3))];
    let actual = [ActualToolCall::new("forecast")
        .with_parameter("location", json!({"city": "Oslo"}))
        .with_parameter("days", json!("three"))
        .with_parameter("verbose", json!(true))];

    let results = ToolCallMatcher::new()
        .match_calls(&expected, &actual, MatchStrategy::OrderIndependent, &schemas)
        .unwrap();
    let validation = results[0].validation.as_ref().unwrap();

    assert!(!validation.type_conformance);
    assert_eq!(validation.hallucinated_parameters, vec!["verbose".to_string()]);
    assert!((validation.completeness - 1.0).abs() < f64::EPSILON);
    assert!((validation.correctness - 0.5).abs() < f64::EPSILON);
    // days present but wrong value and type; verbose costs the extra-parameter bonus
    assert!((results[0].parameter_score.unwrap() - 5.0).abs() < f64::EPSILON);
}

#[test]
fn resolved_schema_flattens_descriptions() {
    let schema = ToolParameterSchema::from_json(&weather_schema_document()).unwrap();
    let descriptions = schema.parameter_descriptions();

    assert_eq!(descriptions.get("days").map(String::as_str), Some("Forecast length"));
    assert_eq!(descriptions.get("location.city").map(String::as_str), Some("City name"));
}

#[test]
fn cached_validation_across_runs() {
    let cache = SchemaCache::new(4, 1);
    let validator = ParameterValidator::with_cache(&cache);
    let document = weather_schema_document();
    let expected = json!({"location": {"city": "Oslo"}});

    for extracted in [json!({"location": {"city": "Oslo"}}), json!({})] {
        validator
            .validate_raw(&document, expected.as_object(), extracted.as_object())
            .unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.misses(), 1);
    assert_eq!(stats.hits(), 1);
}

#[test]
fn failing_lookup_never_becomes_a_classification() {
    let lookup = |tool: &str| -> Result<ToolParameterSchema, InvalidInputError> {
        Err(InvalidInputError::SchemaLookup {
            tool_name: tool.to_string(),
            reason: "server unreachable".to_string(),
        })
    };

    let result = ToolCallMatcher::new().match_calls(
        &[ExpectedToolCall::new("srv", "ping")],
        &[ActualToolCall::new("ping")],
        MatchStrategy::OrderIndependent,
        &lookup,
    );
    assert!(result.is_err());
}

#[test]
fn confidence_table() {
    let evaluator = RunEvaluator::default();
    let expected = [ExpectedToolCall::new("srv", "search")];
    let right: &[ActualToolCall] = &[ActualToolCall::new("search")];
    let wrong: &[ActualToolCall] = &[ActualToolCall::new("delete")];

    let category = |actual: &[ActualToolCall], confidence: Option<f64>| {
        evaluator
            .evaluate(
                &expected,
                actual,
                MatchStrategy::OrderIndependent,
                &NoSchemas,
                confidence,
                None,
            )
            .unwrap()
            .confidence
            .category
    };

    assert_eq!(category(right, Some(0.9)), Some(ConfidenceCategory::Robust));
    assert_eq!(category(wrong, Some(0.9)), Some(ConfidenceCategory::Misleading));
    assert_eq!(category(right, Some(0.2)), Some(ConfidenceCategory::NeedsClarity));
    assert_eq!(category(right, None), None);
}

#[test]
fn custom_thresholds_change_categories() {
    let config: EngineConfig =
        serde_json::from_str(r#"{"high_confidence_threshold": 0.95}"#).unwrap();
    let evaluation = RunEvaluator::new(&config)
        .evaluate(
            &[ExpectedToolCall::new("srv", "search")],
            &[ActualToolCall::new("delete")],
            MatchStrategy::OrderIndependent,
            &NoSchemas,
            Some(0.9),
            None,
        )
        .unwrap();

    assert_eq!(
        evaluation.confidence.category,
        Some(ConfidenceCategory::NeedsClarity)
    );
    assert!(!evaluation.confidence.is_critical());
}

#[test]
fn fleet_metrics_from_evaluated_runs() {
    let evaluator = RunEvaluator::default();
    let search: &[ExpectedToolCall] =
        &[ExpectedToolCall::new("srv", "search").with_parameter("q", json!("rust"))];
    let nothing: &[ExpectedToolCall] = &[];

    let scenarios: Vec<(&[ExpectedToolCall], Vec<ActualToolCall>, Option<ConfidenceLevel>)> = vec![
        (
            search,
            vec![ActualToolCall::new("search").with_parameter("q", json!("Rust"))],
            Some(ConfidenceLevel::High),
        ),
        (
            search,
            vec![ActualToolCall::new("search").with_parameter("q", json!("rust "))],
            Some(ConfidenceLevel::High),
        ),
        (nothing, vec![ActualToolCall::new("search")], Some(ConfidenceLevel::Low)),
        (search, vec![], None),
        (nothing, vec![], Some(ConfidenceLevel::High)),
    ];

    let records: Vec<RunRecord> = scenarios
        .into_iter()
        .enumerate()
        .map(|(i, (expected, actual, level))| {
            evaluator
                .evaluate(
                    expected,
                    &actual,
                    MatchStrategy::OrderIndependent,
                    &NoSchemas,
                    Some(0.8),
                    level,
                )
                .unwrap()
                .to_run_record(format!("run-{i}"), Some(100))
        })
        .collect();

    let summary = MetricsService::new().summarize(&records);
    let two_thirds = 2.0 / 3.0;

    assert_eq!(summary.total, 5);
    assert_eq!(summary.true_positives, 2);
    assert_eq!(summary.false_positives, 1);
    assert_eq!(summary.false_negatives, 1);
    assert_eq!(summary.true_negatives, 1);
    assert!((summary.precision - two_thirds).abs() < 1e-12);
    assert!((summary.recall - two_thirds).abs() < 1e-12);
    assert!((summary.f1 - two_thirds).abs() < 1e-12);
    assert!((summary.parameter_accuracy - 10.0).abs() < f64::EPSILON);
    assert!((summary.avg_execution_time_ms - 100.0).abs() < f64::EPSILON);
    assert_eq!(summary.confidence_category_counts.robust, 2);
    assert_eq!(
        summary.contributing_run_ids,
        vec!["run-0", "run-1", "run-2", "run-3", "run-4"]
    );
}

#[test]
fn empty_fleet() {
    let summary = MetricsService::new().summarize(&[]);
    assert_eq!(summary.total, 0);
    assert!(summary.precision.abs() < f64::EPSILON);
    assert!(summary.contributing_run_ids.is_empty());
}
