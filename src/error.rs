//! Error types for the evaluation engine.
//!
//! Empty call lists, missing parameters and empty schemas are valid inputs
//! with defined results. The variants here cover caller contract violations
//! and malformed schema documents only.

use thiserror::Error;

/// Top-level error type for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The caller broke the input contract.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
    /// A tool schema could not be resolved.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// JSON serialization failed.
    #[error("JSON error in {context}: {message}")]
    Json {
        /// Context where the error occurred.
        context: String,
        /// Error message.
        message: String,
    },
}

/// Caller contract violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// The schema lookup failed for a matched tool.
    #[error("schema lookup for tool '{tool_name}' failed: {reason}")]
    SchemaLookup {
        /// Tool whose schema was requested.
        tool_name: String,
        /// Reason reported by the lookup.
        reason: String,
    },
    /// A parameter payload was not a JSON object.
    #[error("parameters for {context} must be a JSON object: {reason}")]
    InvalidParameters {
        /// What the parameters belonged to.
        context: String,
        /// What was found instead.
        reason: String,
    },
}

/// Errors while resolving a raw JSON-Schema document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema document is not a JSON object.
    #[error("tool schema must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found.
        found: String,
    },
    /// A `$ref` chain refers back to itself.
    #[error("circular reference detected: {reference}")]
    CircularReference {
        /// The reference that closed the cycle.
        reference: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lookup_display() {
        let err = InvalidInputError::SchemaLookup {
            tool_name: "search".to_string(),
            reason: "unknown server".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "schema lookup for tool 'search' failed: unknown server"
        );
    }

    #[test]
    fn eval_error_wraps_sources() {
        let err: EvalError = SchemaError::CircularReference {
            reference: "#/$defs/Node".to_string(),
        }
        .into();
        assert!(matches!(err, EvalError::Schema(_)));
        assert!(err.to_string().contains("#/$defs/Node"));

        let err: EvalError = InvalidInputError::InvalidParameters {
            context: "expected call 'search'".to_string(),
            reason: "found array".to_string(),
        }
        .into();
        assert!(matches!(err, EvalError::InvalidInput(_)));
    }
}
