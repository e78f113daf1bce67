//! Tool parameter schemas derived from JSON-Schema documents.
//!
//! A [`ToolParameterSchema`] is the resolved view of a tool's `inputSchema`:
//! every internal `$ref` (`#/$defs/...` or `#/definitions/...`) under
//! `properties` is inlined, and only the parts the engine reads are kept.
//! Missing or unrecognized type information never fails a check.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::value::RuntimeType;

const DEFS_PREFIX: &str = "#/$defs/";
const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// A JSON-Schema primitive type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// `"string"`
    String,
    /// `"number"`: any number.
    Number,
    /// `"integer"`: integral numbers only.
    Integer,
    /// `"boolean"`
    Boolean,
    /// `"array"`
    Array,
    /// `"object"`
    Object,
    /// `"null"`
    Null,
}

impl JsonType {
    /// Parses a JSON-Schema type name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// Returns the JSON-Schema name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }

    /// Returns true if `value` has a runtime type this schema type allows.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        let runtime = RuntimeType::of(value);
        match self {
            Self::String => runtime == RuntimeType::String,
            Self::Number => runtime.is_numeric(),
            Self::Integer => runtime == RuntimeType::Integer,
            Self::Boolean => runtime == RuntimeType::Boolean,
            Self::Array => runtime == RuntimeType::Array,
            Self::Object => runtime == RuntimeType::Object,
            Self::Null => runtime == RuntimeType::Null,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single tool parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Type names as declared, recognized or not.
    declared_types: Vec<String>,
    /// Human-readable description.
    description: Option<String>,
    /// Nested properties of an object-typed parameter.
    properties: BTreeMap<String, PropertySchema>,
}

impl PropertySchema {
    /// Creates a property with no type information.
    #[must_use]
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Creates a property of a single type.
    #[must_use]
    pub fn of_type(json_type: JsonType) -> Self {
        Self {
            declared_types: vec![json_type.as_str().to_string()],
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a nested property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, property: Self) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let declared_types = match map.get("type") {
            Some(Value::String(name)) => vec![name.clone()],
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        let description = map
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let properties = map
            .get("properties")
            .and_then(Value::as_object)
            .map(parse_properties)
            .unwrap_or_default();

        Self {
            declared_types,
            description,
            properties,
        }
    }

    /// Returns the declared type names.
    #[must_use]
    pub fn declared_types(&self) -> &[String] {
        &self.declared_types
    }

    /// Returns the declared type for reporting, or `"unknown"`.
    #[must_use]
    pub fn type_label(&self) -> String {
        if self.declared_types.is_empty() {
            "unknown".to_string()
        } else {
            self.declared_types.join("|")
        }
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns true if `value` conforms to the declared type.
    ///
    /// `null`, an undeclared type, and any unrecognized type name all
    /// conform. A list of types conforms if any entry does.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() || self.declared_types.is_empty() {
            return true;
        }
        self.declared_types
            .iter()
            .any(|name| JsonType::parse(name).is_none_or(|t| t.accepts(value)))
    }

    fn is_object(&self) -> bool {
        self.declared_types.iter().any(|t| t == "object")
    }
}

/// Resolved parameter schema of one tool.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval::ToolParameterSchema;
///
/// let schema = ToolParameterSchema::from_json(&json!({
///     "type": "object",
///     "properties": {
///         "unit": {"$ref": "#/$defs/Unit"},
///         "city": {"type": "string"}
///     },
///     "required": ["city"],
///     "$defs": {"Unit": {"type": "string", "description": "Temperature unit"}}
/// }))
/// .unwrap();
///
/// assert!(schema.contains("unit"));
/// assert_eq!(schema.property("unit").unwrap().type_label(), "string");
/// assert_eq!(schema.required(), ["city".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameterSchema {
    /// Declared parameters.
    properties: BTreeMap<String, PropertySchema>,
    /// Names of required parameters, in declaration order.
    required: Vec<String>,
}

impl ToolParameterSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schema from a raw JSON-Schema document, resolving `$ref`s.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotAnObject` if the document is not an object,
    /// or `SchemaError::CircularReference` if a `$ref` chain loops.
    pub fn from_json(document: &Value) -> Result<Self, SchemaError> {
        let resolved = resolve_refs(document)?;
        Ok(Self::from_resolved(&resolved))
    }

    /// Builds a schema from a document whose `$ref`s are already inlined.
    #[must_use]
    pub fn from_resolved(document: &Value) -> Self {
        let properties = document
            .get("properties")
            .and_then(Value::as_object)
            .map(parse_properties)
            .unwrap_or_default();
        let required = document
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            properties,
            required,
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, property: PropertySchema) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Marks a parameter as required.
    #[must_use]
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Returns true if the schema declares no parameters and no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.required.is_empty()
    }

    /// Returns the declared parameters.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, PropertySchema> {
        &self.properties
    }

    /// Returns the schema of one parameter.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    /// Returns true if the parameter is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Returns the required parameter names.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Returns every parameter description, flattening nested objects.
    ///
    /// Nested keys are dotted (`address.street`). An object parameter is
    /// listed itself only when it has a description.
    #[must_use]
    pub fn parameter_descriptions(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        collect_descriptions(&self.properties, "", &mut out);
        out
    }
}

fn parse_properties(map: &Map<String, Value>) -> BTreeMap<String, PropertySchema> {
    map.iter()
        .map(|(name, value)| (name.clone(), PropertySchema::from_value(value)))
        .collect()
}

fn collect_descriptions(
    properties: &BTreeMap<String, PropertySchema>,
    prefix: &str,
    out: &mut BTreeMap<String, String>,
) {
    for (name, property) in properties {
        let full_name = format!("{prefix}{name}");
        let description = property.description().unwrap_or_default();

        if property.is_object() && !property.properties.is_empty() {
            if !description.is_empty() {
                out.insert(full_name.clone(), description.to_string());
            }
            collect_descriptions(&property.properties, &format!("{full_name}."), out);
        } else {
            out.insert(full_name, description.to_string());
        }
    }
}

/// Inlines internal `$ref`s found under the document's `properties`.
///
/// Definitions are read from `$defs`, falling back to `definitions`. Sibling
/// keys next to a `$ref` (such as `description`) are kept when the
/// definition does not set them. References that cannot be found, and
/// references outside the document, are left as they are.
///
/// # Errors
///
/// Returns `SchemaError::NotAnObject` for a non-object document and
/// `SchemaError::CircularReference` when a reference chain loops.
pub fn resolve_refs(document: &Value) -> Result<Value, SchemaError> {
    let Value::Object(root) = document else {
        return Err(SchemaError::NotAnObject {
            found: RuntimeType::of(document).to_string(),
        });
    };

    let empty = Map::new();
    let defs = root
        .get("$defs")
        .or_else(|| root.get("definitions"))
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut resolved = root.clone();
    if let Some(properties) = root.get("properties") {
        let mut chain = Vec::new();
        resolved.insert(
            "properties".to_string(),
            resolve_value(properties, defs, &mut chain)?,
        );
    }
    Ok(Value::Object(resolved))
}

fn resolve_value(
    value: &Value,
    defs: &Map<String, Value>,
    chain: &mut Vec<String>,
) -> Result<Value, SchemaError> {
    match value {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref") {
                return resolve_reference(map, reference, defs, chain);
            }
            let mut out = Map::new();
            for (key, item) in map {
                out.insert(key.clone(), resolve_value(item, defs, chain)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(item, defs, chain))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn resolve_reference(
    map: &Map<String, Value>,
    reference: &Value,
    defs: &Map<String, Value>,
    chain: &mut Vec<String>,
) -> Result<Value, SchemaError> {
    let Some(reference) = reference.as_str() else {
        return Ok(Value::Object(map.clone()));
    };
    let Some(name) = reference
        .strip_prefix(DEFS_PREFIX)
        .or_else(|| reference.strip_prefix(DEFINITIONS_PREFIX))
    else {
        return Ok(Value::Object(map.clone()));
    };

    if chain.iter().any(|seen| seen == reference) {
        return Err(SchemaError::CircularReference {
            reference: reference.to_string(),
        });
    }

    let Some(definition) = defs.get(name) else {
        tracing::warn!(reference, "Reference not found in schema definitions");
        return Ok(Value::Object(map.clone()));
    };

    chain.push(reference.to_string());
    let resolved = resolve_value(definition, defs, chain);
    chain.pop();

    let mut resolved = resolved?;
    if let Value::Object(target) = &mut resolved {
        for (key, item) in map {
            if key != "$ref" && !target.contains_key(key) {
                target.insert(key.clone(), item.clone());
            }
        }
    }
    Ok(resolved)
}
