//! Schema-aware validation of extracted tool parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::metrics::ratio;
use crate::schema::{PropertySchema, ToolParameterSchema};
use crate::schema_cache::SchemaCache;
use crate::tool_call::Parameters;
use crate::value::{RuntimeType, values_match};

/// Comparison of one expected parameter against the extracted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterComparison {
    /// Parameter name.
    pub parameter_name: String,
    /// Value the test case expects.
    pub expected_value: Value,
    /// Value the model supplied, if present.
    pub actual_value: Option<Value>,
    /// Whether the model supplied the parameter at all.
    pub is_present: bool,
    /// Whether the supplied value matches after normalization.
    pub is_correct: bool,
    /// Whether the supplied value conforms to the schema type.
    pub type_matches: bool,
    /// Type declared by the schema, or `"unknown"`.
    pub expected_type: String,
    /// Runtime type of the supplied value.
    pub actual_type: Option<RuntimeType>,
}

/// Result of validating an extracted parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValidationResult {
    /// One comparison per expected parameter.
    pub comparisons: Vec<ParameterComparison>,
    /// Share of expected required parameters that were supplied (0-1).
    pub completeness: f64,
    /// Share of expected parameters with matching values (0-1).
    pub correctness: f64,
    /// Whether every supplied, declared parameter has a schema-conformant type.
    pub type_conformance: bool,
    /// Supplied parameters the schema does not declare.
    pub hallucinated_parameters: Vec<String>,
    /// Expected required parameters that were not supplied.
    pub missing_required: Vec<String>,
}

impl ParameterValidationResult {
    /// Returns true if every signal is at its best value.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.type_conformance
            && self.hallucinated_parameters.is_empty()
            && self.missing_required.is_empty()
            && self.comparisons.iter().all(|c| c.is_present && c.is_correct)
    }
}

/// Validates extracted parameters against expected values and a schema.
///
/// Holds no state of its own. An optional [`SchemaCache`] owned by the
/// caller is consulted when validating against raw schema documents.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval::{JsonType, ParameterValidator, PropertySchema, ToolParameterSchema};
///
/// let schema = ToolParameterSchema::new()
///     .with_property("city", PropertySchema::of_type(JsonType::String))
///     .with_required("city");
///
/// let expected = json!({"city": "Paris"});
/// let extracted = json!({"city": "paris", "units": "metric"});
///
/// let result = ParameterValidator::new().validate(
///     &schema,
///     expected.as_object(),
///     extracted.as_object(),
/// );
///
/// assert!((result.correctness - 1.0).abs() < f64::EPSILON);
/// assert_eq!(result.hallucinated_parameters, vec!["units".to_string()]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterValidator<'c> {
    cache: Option<&'c SchemaCache>,
}

impl<'c> ParameterValidator<'c> {
    /// Creates a validator without a schema cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { cache: None }
    }

    /// Creates a validator that resolves raw schemas through `cache`.
    #[must_use]
    pub const fn with_cache(cache: &'c SchemaCache) -> Self {
        Self { cache: Some(cache) }
    }

    /// Validates `extracted` against `expected` under a resolved schema.
    ///
    /// Missing maps are treated as empty. Never fails.
    #[must_use]
    pub fn validate(
        &self,
        schema: &ToolParameterSchema,
        expected: Option<&Parameters>,
        extracted: Option<&Parameters>,
    ) -> ParameterValidationResult {
        let empty = Parameters::new();
        let expected = expected.unwrap_or(&empty);
        let extracted = extracted.unwrap_or(&empty);

        let comparisons: Vec<ParameterComparison> = expected
            .iter()
            .map(|(name, expected_value)| compare(schema, name, expected_value, extracted))
            .collect();

        let relevant_required: Vec<&String> = schema
            .required()
            .iter()
            .filter(|name| expected.contains_key(name.as_str()))
            .collect();
        let missing_required: Vec<String> = relevant_required
            .iter()
            .filter(|name| !extracted.contains_key(name.as_str()))
            .map(|name| (*name).clone())
            .collect();
        let completeness = if relevant_required.is_empty() {
            1.0
        } else {
            ratio(
                relevant_required.len() - missing_required.len(),
                relevant_required.len(),
            )
        };

        let correctness = if comparisons.is_empty() {
            1.0
        } else {
            ratio(
                comparisons.iter().filter(|c| c.is_correct).count(),
                comparisons.len(),
            )
        };

        let type_conformance = extracted.iter().all(|(name, value)| {
            schema
                .property(name)
                .is_none_or(|property| property.accepts(value))
        });

        let hallucinated_parameters: Vec<String> = extracted
            .keys()
            .filter(|name| !schema.contains(name))
            .cloned()
            .collect();

        tracing::debug!(
            expected = expected.len(),
            extracted = extracted.len(),
            completeness,
            correctness,
            type_conformance,
            hallucinated = hallucinated_parameters.len(),
            "Validated tool parameters"
        );

        ParameterValidationResult {
            comparisons,
            completeness,
            correctness,
            type_conformance,
            hallucinated_parameters,
            missing_required,
        }
    }

    /// Resolves a raw JSON-Schema document, then validates against it.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the document is not an object or contains a
    /// circular `$ref`.
    pub fn validate_raw(
        &self,
        document: &Value,
        expected: Option<&Parameters>,
        extracted: Option<&Parameters>,
    ) -> Result<ParameterValidationResult, SchemaError> {
        let schema = match self.cache {
            Some(cache) => cache.resolve(document)?,
            None => ToolParameterSchema::from_json(document)?,
        };
        Ok(self.validate(&schema, expected, extracted))
    }
}

fn compare(
    schema: &ToolParameterSchema,
    name: &str,
    expected_value: &Value,
    extracted: &Parameters,
) -> ParameterComparison {
    let actual_value = extracted.get(name);
    let property = schema.property(name);

    let type_matches = match (actual_value, property) {
        (Some(value), Some(property)) => property.accepts(value),
        _ => true,
    };

    ParameterComparison {
        parameter_name: name.to_string(),
        expected_value: expected_value.clone(),
        actual_value: actual_value.cloned(),
        is_present: actual_value.is_some(),
        is_correct: values_match(expected_value, actual_value),
        type_matches,
        expected_type: property.map_or_else(|| "unknown".to_string(), PropertySchema::type_label),
        actual_type: actual_value.filter(|v| !v.is_null()).map(RuntimeType::of),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JsonType;
    use serde_json::json;

    fn weather_schema() -> ToolParameterSchema {
        ToolParameterSchema::new()
            .with_property("city", PropertySchema::of_type(JsonType::String))
            .with_property("days", PropertySchema::of_type(JsonType::Integer))
            .with_property("metric", PropertySchema::of_type(JsonType::Boolean))
            .with_required("city")
            .with_required("days")
    }

    fn params(value: &Value) -> Option<&Parameters> {
        value.as_object()
    }

    #[test]
    fn perfect_extraction() {
        let expected = json!({"city": "Oslo", "days": 3});
        let extracted = json!({"city": "oslo ", "days": 3});
        let result =
            ParameterValidator::new().validate(&weather_schema(), params(&expected), params(&extracted));

        assert!((result.completeness - 1.0).abs() < f64::EPSILON);
        assert!((result.correctness - 1.0).abs() < f64::EPSILON);
        assert!(result.type_conformance);
        assert!(result.hallucinated_parameters.is_empty());
        assert!(result.missing_required.is_empty());
        assert!(result.is_perfect());
    }

    #[test]
    fn missing_required_lowers_completeness() {
        let expected = json!({"city": "Oslo", "days": 3});
        let extracted = json!({"city": "Oslo"});
        let result =
            ParameterValidator::new().validate(&weather_schema(), params(&expected), params(&extracted));

        assert!((result.completeness - 0.5).abs() < f64::EPSILON);
        assert!((result.correctness - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.missing_required, vec!["days".to_string()]);

        let days = &result.comparisons[1];
        assert_eq!(days.parameter_name, "days");
        assert!(!days.is_present);
        assert!(days.type_matches);
        assert_eq!(days.actual_type, None);
    }

    #[test]
    fn required_but_unexpected_fields_are_ignored() {
        let expected = json!({"city": "Oslo"});
        let extracted = json!({"city": "Oslo"});
        let result =
            ParameterValidator::new().validate(&weather_schema(), params(&expected), params(&extracted));

        assert!((result.completeness - 1.0).abs() < f64::EPSILON);
        assert!(result.missing_required.is_empty());
    }

    #[test]
    fn wrong_type_breaks_conformance() {
        let expected = json!({"days": 3});
        let extracted = json!({"days": "3"});
        let result =
            ParameterValidator::new().validate(&weather_schema(), params(&expected), params(&extracted));

        assert!(!result.type_conformance);
        assert!(!result.comparisons[0].type_matches);
        assert_eq!(result.comparisons[0].expected_type, "integer");
        assert_eq!(result.comparisons[0].actual_type, Some(RuntimeType::String));
        assert!(!result.comparisons[0].is_correct);
    }

    #[test]
    fn unexpected_declared_parameter_still_checked_for_type() {
        let expected = json!({"city": "Oslo"});
        let extracted = json!({"city": "Oslo", "metric": "yes"});
        let result =
            ParameterValidator::new().validate(&weather_schema(), params(&expected), params(&extracted));

        assert!(!result.type_conformance);
        assert!(result.hallucinated_parameters.is_empty());
    }

    #[test]
    fn undeclared_parameters_are_hallucinated() {
        let expected = json!({"city": "Oslo"});
        let extracted = json!({"city": "Oslo", "country": "NO"});
        let result =
            ParameterValidator::new().validate(&weather_schema(), params(&expected), params(&extracted));

        assert!(result.type_conformance);
        assert_eq!(result.hallucinated_parameters, vec!["country".to_string()]);
        assert!(!result.is_perfect());
    }

    #[test]
    fn empty_inputs_are_total() {
        let result = ParameterValidator::new().validate(&ToolParameterSchema::new(), None, None);

        assert!(result.comparisons.is_empty());
        assert!((result.completeness - 1.0).abs() < f64::EPSILON);
        assert!((result.correctness - 1.0).abs() < f64::EPSILON);
        assert!(result.type_conformance);
        assert!(result.hallucinated_parameters.is_empty());
    }

    #[test]
    fn unknown_type_reports_unknown() {
        let schema = ToolParameterSchema::new().with_property("q", PropertySchema::untyped());
        let expected = json!({"q": 1, "r": 2});
        let extracted = json!({"q": "one"});
        let result = ParameterValidator::new().validate(&schema, params(&expected), params(&extracted));

        assert_eq!(result.comparisons[0].expected_type, "unknown");
        assert!(result.comparisons[0].type_matches);
        assert_eq!(result.comparisons[1].expected_type, "unknown");
        assert!(result.type_conformance);
    }

    #[test]
    fn validate_raw_resolves_through_cache() {
        let cache = SchemaCache::new(8, 2);
        let validator = ParameterValidator::with_cache(&cache);
        let document = json!({
            "properties": {"unit": {"$ref": "#/$defs/Unit"}},
            "$defs": {"Unit": {"type": "string"}}
        });
        let expected = json!({"unit": "C"});
        let extracted = json!({"unit": 1});

        let first = validator
            .validate_raw(&document, params(&expected), params(&extracted))
            .unwrap();
        let second = validator
            .validate_raw(&document, params(&expected), params(&extracted))
            .unwrap();

        assert!(!first.type_conformance);
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits(), 1);
    }

    #[test]
    fn validate_raw_rejects_cycles() {
        let document = json!({
            "properties": {"a": {"$ref": "#/$defs/A"}},
            "$defs": {"A": {"$ref": "#/$defs/A"}}
        });
        let err = ParameterValidator::new()
            .validate_raw(&document, None, None)
            .unwrap_err();
        assert!(matches!(err, SchemaError::CircularReference { .. }));
    }
}
