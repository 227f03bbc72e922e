//! Parameter schemas and pre-dispatch validation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// Runtime type a schema property constrains its value to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl PropertyKind {
    fn name(self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Number => "number",
            PropertyKind::Integer => "integer",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Array => "array",
            PropertyKind::Object => "object",
        }
    }

    /// Whether a JSON value satisfies this kind. `number` and
    /// `integer` both accept any numeric value.
    fn matches(self, value: &Value) -> bool {
        match self {
            PropertyKind::String => value.is_string(),
            PropertyKind::Number | PropertyKind::Integer => value.is_number(),
            PropertyKind::Boolean => value.is_boolean(),
            PropertyKind::Array => value.is_array(),
            PropertyKind::Object => value.is_object(),
        }
    }
}

/// One property constraint within a [`ToolSchema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Declares the parameters object a tool accepts.
///
/// Fields listed in `required` must be present; fields declared in
/// `properties` must match their declared type when present. Fields
/// that appear in neither pass through unchecked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: HashMap<String, PropertySchema>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required, typed field.
    pub fn require(mut self, field: impl Into<String>, kind: PropertyKind) -> Self {
        let field = field.into();
        self.required.push(field.clone());
        self.properties.insert(
            field,
            PropertySchema {
                kind,
                description: None,
            },
        );
        self
    }

    /// Declare an optional, typed field.
    pub fn property(mut self, field: impl Into<String>, kind: PropertyKind) -> Self {
        self.properties.insert(
            field.into(),
            PropertySchema {
                kind,
                description: None,
            },
        );
        self
    }

    /// Validate a parameters object, failing fast on the first
    /// violation. The tool is never invoked when this fails.
    pub fn validate(&self, params: &Value) -> Result<(), ToolError> {
        for field in &self.required {
            if params.get(field).is_none() {
                return Err(ToolError::MissingParameter(field.clone()));
            }
        }

        for (field, property) in &self.properties {
            if let Some(value) = params.get(field) {
                if !property.kind.matches(value) {
                    return Err(ToolError::ParameterType {
                        field: field.clone(),
                        expected: property.kind.name().to_string(),
                        actual: json_type_name(value).to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_required_field() {
        let schema = ToolSchema::new().require("a", PropertyKind::String);

        let err = schema.validate(&json!({})).unwrap_err();

        assert_eq!(err.to_string(), "missing required parameter: a");
    }

    #[test]
    fn test_type_mismatch_message() {
        let schema = ToolSchema::new().property("a", PropertyKind::Number);

        let err = schema.validate(&json!({"a": "x"})).unwrap_err();

        assert_eq!(
            err.to_string(),
            "parameter a should be of type number, got string"
        );
    }

    #[test]
    fn test_integer_accepts_any_number() {
        let schema = ToolSchema::new().property("n", PropertyKind::Integer);

        assert!(schema.validate(&json!({"n": 3})).is_ok());
        assert!(schema.validate(&json!({"n": 3.5})).is_ok());
        assert!(schema.validate(&json!({"n": false})).is_err());
    }

    #[test]
    fn test_array_checked_by_arrayness() {
        let schema = ToolSchema::new().property("items", PropertyKind::Array);

        assert!(schema.validate(&json!({"items": [1, 2]})).is_ok());
        assert!(schema.validate(&json!({"items": {"0": 1}})).is_err());
    }

    #[test]
    fn test_undeclared_fields_pass_through() {
        let schema = ToolSchema::new().require("a", PropertyKind::String);

        assert!(schema.validate(&json!({"a": "ok", "extra": 1})).is_ok());
    }

    #[test]
    fn test_non_object_params_fail_required() {
        let schema = ToolSchema::new().require("a", PropertyKind::String);

        assert!(schema.validate(&Value::Null).is_err());
    }
}
