//! Value normalization shared by parameter validation and scoring.
//!
//! Normalization decides equality only, never ordering:
//!
//! - a missing or `null` actual value never matches,
//! - exact JSON equality short-circuits,
//! - strings compare case-insensitively after trimming,
//! - numbers compare by float value (`1` matches `1.0`),
//! - an expected boolean accepts the strings `"true"`, `"yes"` and `"1"` as `true`
//!   and any other string as `false`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::TRUTHY_STRINGS;

/// Runtime type of a JSON value, with integers and floats kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeType {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Boolean,
    /// Integral JSON number.
    Integer,
    /// Floating-point JSON number.
    Float,
    /// JSON string.
    String,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl RuntimeType {
    /// Returns the runtime type of `value`.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns true for integers and floats.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Returns the lowercase name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `actual` matches `expected` after normalization.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval::values_match;
///
/// assert!(values_match(&json!("Paris"), Some(&json!("  paris "))));
/// assert!(values_match(&json!(3), Some(&json!(3.0))));
/// assert!(values_match(&json!(true), Some(&json!("Yes"))));
/// assert!(!values_match(&json!("x"), None));
/// ```
#[must_use]
#[allow(clippy::float_cmp)]
pub fn values_match(expected: &Value, actual: Option<&Value>) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    if actual.is_null() {
        return false;
    }
    if expected == actual {
        return true;
    }

    match (expected, actual) {
        (Value::String(e), Value::String(a)) => e.trim().to_lowercase() == a.trim().to_lowercase(),
        (Value::Number(e), Value::Number(a)) => match (e.as_f64(), a.as_f64()) {
            (Some(e), Some(a)) => e == a,
            _ => false,
        },
        (Value::Bool(e), Value::String(a)) => {
            *e == TRUTHY_STRINGS.contains(&a.to_lowercase().as_str())
        }
        _ => false,
    }
}

/// Returns true if both values share a runtime type, or both are numbers.
#[must_use]
pub fn types_match(actual: &Value, expected: &Value) -> bool {
    let actual = RuntimeType::of(actual);
    let expected = RuntimeType::of(expected);
    actual == expected || (actual.is_numeric() && expected.is_numeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_ignore_case_and_padding() {
        assert!(values_match(&json!("New York"), Some(&json!(" new york"))));
        assert!(!values_match(&json!("New York"), Some(&json!("Newark"))));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_match(&json!(2), Some(&json!(2.0))));
        assert!(values_match(&json!(0.5), Some(&json!(0.5))));
        assert!(!values_match(&json!(2), Some(&json!(3))));
    }

    #[test]
    fn bool_accepts_truthy_strings() {
        assert!(values_match(&json!(true), Some(&json!("TRUE"))));
        assert!(values_match(&json!(true), Some(&json!("1"))));
        assert!(values_match(&json!(false), Some(&json!("no"))));
        assert!(!values_match(&json!(false), Some(&json!("yes"))));
    }

    #[test]
    fn missing_or_null_never_matches() {
        assert!(!values_match(&json!("a"), None));
        assert!(!values_match(&Value::Null, Some(&Value::Null)));
    }

    #[test]
    fn structured_values_need_exact_equality() {
        assert!(values_match(&json!([1, 2]), Some(&json!([1, 2]))));
        assert!(!values_match(&json!(["A"]), Some(&json!(["a"]))));
        assert!(!values_match(&json!({"k": 1}), Some(&json!("{\"k\": 1}"))));
    }

    #[test]
    fn runtime_types() {
        assert_eq!(RuntimeType::of(&json!(1)), RuntimeType::Integer);
        assert_eq!(RuntimeType::of(&json!(1.5)), RuntimeType::Float);
        assert_eq!(RuntimeType::of(&json!(null)), RuntimeType::Null);
        assert_eq!(RuntimeType::of(&json!({})).to_string(), "object");
    }

    #[test]
    fn numeric_types_are_compatible() {
        assert!(types_match(&json!(1), &json!(1.5)));
        assert!(types_match(&json!("a"), &json!("b")));
        assert!(!types_match(&json!("1"), &json!(1)));
        assert!(!types_match(&json!(true), &json!(1)));
    }
}
