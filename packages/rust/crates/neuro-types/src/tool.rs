//! Tool definitions (registered once) and tool calls (one per loop iteration).

use std::collections::{BTreeMap, BTreeSet, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use crate::{NeuroError, NeuroResult};

/// JSON type accepted by a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// UTF-8 string.
    String,
    /// Whole number (`4` and `4.0` both qualify).
    Integer,
    /// Any JSON number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl ParamKind {
    /// JSON-schema type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether `value` has this kind.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value
                        .as_f64()
                        .is_some_and(|number| number.is_finite() && number.fract() == 0.0)
            }
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolParameter {
    /// Parameter name.
    pub name: String,
    /// Expected JSON type.
    pub kind: ParamKind,
    /// Shown to the reasoning engine.
    pub description: String,
    /// Whether the call must supply it.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Inclusive lower bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Closed set of accepted string values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

fn default_required() -> bool {
    true
}

impl ToolParameter {
    /// Required parameter.
    #[must_use]
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
            minimum: None,
            maximum: None,
            allowed_values: None,
        }
    }

    /// Optional parameter.
    #[must_use]
    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Inclusive numeric range.
    #[must_use]
    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Inclusive numeric lower bound.
    #[must_use]
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Closed set of accepted string values.
    #[must_use]
    pub fn with_allowed(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(ToString::to_string).collect());
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!(self.kind.as_str()));
        schema.insert("description".to_string(), json!(self.description));
        if let Some(minimum) = self.minimum {
            schema.insert("minimum".to_string(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            schema.insert("maximum".to_string(), json!(maximum));
        }
        if let Some(ref allowed) = self.allowed_values {
            schema.insert("enum".to_string(), json!(allowed));
        }
        Value::Object(schema)
    }
}

/// Immutable tool definition, registered once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolDefinition {
    /// Unique tool name; also the backend operation name.
    pub name: String,
    /// Shown to the reasoning engine.
    pub description: String,
    /// Retrieval category (`data`, `preprocessing`, ...).
    pub category: String,
    /// Declared parameters, in display order.
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    /// Effect is hard or impossible to reverse; always needs confirmation.
    #[serde(default)]
    pub is_destructive: bool,
    /// Backend call may run for minutes (training jobs).
    #[serde(default)]
    pub long_running: bool,
    /// Stages the tool is documented for. Advisory: visibility comes from the backend.
    #[serde(default)]
    pub applicable_stages: BTreeSet<String>,
}

impl ToolDefinition {
    /// Definition with no parameters.
    #[must_use]
    pub fn new(name: &str, description: &str, category: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            parameters: Vec::new(),
            is_destructive: false,
            long_running: false,
            applicable_stages: BTreeSet::new(),
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Mark as destructive.
    #[must_use]
    pub fn destructive(mut self) -> Self {
        self.is_destructive = true;
        self
    }

    /// Mark as long-running.
    #[must_use]
    pub fn long_running(mut self) -> Self {
        self.long_running = true;
        self
    }

    /// Documented stages.
    #[must_use]
    pub fn stages(mut self, stages: &[&str]) -> Self {
        self.applicable_stages = stages.iter().map(ToString::to_string).collect();
        self
    }

    /// Look up a declared parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|param| param.name == name)
    }

    /// Reject duplicate parameter names and inverted ranges.
    pub fn validate(&self) -> NeuroResult<()> {
        if self.name.trim().is_empty() {
            return Err(NeuroError::InvalidDefinition {
                tool: self.name.clone(),
                reason: "empty tool name".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for param in &self.parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(NeuroError::InvalidDefinition {
                    tool: self.name.clone(),
                    reason: format!("duplicate parameter `{}`", param.name),
                });
            }
            if let (Some(minimum), Some(maximum)) = (param.minimum, param.maximum)
                && minimum > maximum
            {
                return Err(NeuroError::InvalidDefinition {
                    tool: self.name.clone(),
                    reason: format!("parameter `{}` has minimum > maximum", param.name),
                });
            }
        }
        Ok(())
    }

    /// JSON schema of the parameter object.
    #[must_use]
    pub fn parameters_schema(&self) -> Value {
        let properties = self
            .parameters
            .iter()
            .map(|param| (param.name.clone(), param.json_schema()))
            .collect::<Map<String, Value>>();
        let required = self
            .parameters
            .iter()
            .filter(|param| param.required)
            .map(|param| param.name.clone())
            .collect::<Vec<_>>();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Full schema: name, description, flags and parameters.
    #[must_use]
    pub fn json_schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "category": self.category,
            "destructive": self.is_destructive,
            "long_running": self.long_running,
            "parameters": self.parameters_schema(),
        })
    }
}

/// Structured invocation extracted from reasoning-engine output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolCall {
    /// Tool to invoke.
    #[serde(rename = "name")]
    pub tool_name: String,
    /// Named parameters; sorted so serialization is canonical.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl ToolCall {
    /// Call with no parameters.
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Add one parameter.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    /// Raw parameter value.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Numeric parameter value.
    #[must_use]
    pub fn param_f64(&self, name: &str) -> Option<f64> {
        self.param(name).and_then(Value::as_f64)
    }

    /// String parameter value.
    #[must_use]
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    /// Canonical JSON (`{"name":..,"parameters":{..}}`, keys sorted).
    pub fn canonical_json(&self) -> NeuroResult<String> {
        serde_json::to_string(self).map_err(|error| NeuroError::Serialization(error.to_string()))
    }

    /// Stable identity of `(tool_name, parameters)`: sha256 of the canonical JSON.
    #[must_use]
    pub fn signature(&self) -> String {
        let canonical = self
            .canonical_json()
            .unwrap_or_else(|_| format!("{}:{:?}", self.tool_name, self.parameters));
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }

    /// Parameters as a JSON object.
    #[must_use]
    pub fn parameters_value(&self) -> Value {
        Value::Object(
            self.parameters
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_kind_accepts_whole_floats() {
        assert!(ParamKind::Integer.matches(&json!(4)));
        assert!(ParamKind::Integer.matches(&json!(4.0)));
        assert!(!ParamKind::Integer.matches(&json!(4.5)));
        assert!(!ParamKind::Integer.matches(&json!("4")));
    }

    #[test]
    fn signature_ignores_parameter_insertion_order() {
        let left = ToolCall::new("apply_filter")
            .with_param("low", 4)
            .with_param("high", 40);
        let right = ToolCall::new("apply_filter")
            .with_param("high", 40)
            .with_param("low", 4);
        assert_eq!(left.signature(), right.signature());
        assert_ne!(
            left.signature(),
            ToolCall::new("apply_filter").with_param("low", 4).signature()
        );
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let def = ToolDefinition::new("resample", "Resample", "preprocessing").param(
            ToolParameter::required("target_rate", ParamKind::Number, "Hz").with_range(10.0, 1.0),
        );
        assert!(def.validate().is_err());
    }
}
