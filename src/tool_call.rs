//! Expected and actual tool call types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InvalidInputError;

/// Parameter map of a tool call, keyed by parameter name.
pub type Parameters = serde_json::Map<String, Value>;

/// A tool invocation a test case declares as correct.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval::ExpectedToolCall;
///
/// let call = ExpectedToolCall::new("http://weather.local/mcp", "get_forecast")
///     .with_parameter("city", json!("Oslo"));
///
/// assert_eq!(call.tool_name(), "get_forecast");
/// assert_eq!(call.parameters().map(|p| p.len()), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedToolCall {
    /// Server the tool is expected to come from.
    server_identifier: String,
    /// Name of the expected tool.
    tool_name: String,
    /// Expected parameter values, if any were declared.
    parameters: Option<Parameters>,
}

impl ExpectedToolCall {
    /// Creates an expected call with no declared parameters.
    #[must_use]
    pub fn new(server_identifier: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            server_identifier: server_identifier.into(),
            tool_name: tool_name.into(),
            parameters: None,
        }
    }

    /// Creates an expected call from a raw JSON parameter payload.
    ///
    /// `null` means no parameters were declared.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputError::InvalidParameters` if `parameters` is
    /// neither an object nor `null`.
    pub fn from_json(
        server_identifier: impl Into<String>,
        tool_name: impl Into<String>,
        parameters: Value,
    ) -> Result<Self, InvalidInputError> {
        let tool_name = tool_name.into();
        let parameters = parameters_from_json(&format!("expected call '{tool_name}'"), parameters)?;
        Ok(Self {
            server_identifier: server_identifier.into(),
            tool_name,
            parameters,
        })
    }

    /// Sets the full expected parameter map.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Adds one expected parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters
            .get_or_insert_with(Parameters::new)
            .insert(name.into(), value);
        self
    }

    /// Returns the expected server identifier.
    #[must_use]
    pub fn server_identifier(&self) -> &str {
        &self.server_identifier
    }

    /// Returns the expected tool name.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Returns the expected parameters.
    #[must_use]
    pub fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }
}

/// A tool invocation the model actually attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualToolCall {
    /// Name of the tool the model called.
    tool_name: String,
    /// Arguments the model supplied.
    parameters: Parameters,
    /// Tool response, when the transcript included one.
    response: Option<Value>,
    /// Server hosting the tool, when the transcript reveals it.
    server_name: Option<String>,
}

impl ActualToolCall {
    /// Creates an actual call with no parameters.
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters: Parameters::new(),
            response: None,
            server_name: None,
        }
    }

    /// Creates an actual call from a raw JSON argument payload.
    ///
    /// `null` is read as an empty argument map.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInputError::InvalidParameters` if `parameters` is
    /// neither an object nor `null`.
    pub fn from_json(tool_name: impl Into<String>, parameters: Value) -> Result<Self, InvalidInputError> {
        let tool_name = tool_name.into();
        let parameters = parameters_from_json(&format!("actual call '{tool_name}'"), parameters)?
            .unwrap_or_default();
        Ok(Self {
            tool_name,
            parameters,
            response: None,
            server_name: None,
        })
    }

    /// Sets the argument map.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Adds one argument.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Sets the tool response.
    #[must_use]
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Sets the hosting server name.
    #[must_use]
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    /// Returns the called tool name.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Returns the supplied arguments.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns the tool response.
    #[must_use]
    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    /// Returns the hosting server name.
    #[must_use]
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }
}

fn parameters_from_json(context: &str, value: Value) -> Result<Option<Parameters>, InvalidInputError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(InvalidInputError::InvalidParameters {
            context: context.to_string(),
            reason: format!("found {}", crate::value::RuntimeType::of(&other)),
        }),
    }
}
