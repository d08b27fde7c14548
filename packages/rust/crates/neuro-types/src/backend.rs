//! Backend facade wire shapes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized `{success, data, error}` returned by every backend operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Operation payload.
    #[serde(default)]
    pub data: Option<Value>,
    /// Error text when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl BackendResult {
    /// Successful result.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed result.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Current backend stage and the tool names it permits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Stage identifier (`empty`, `data_loaded`, `preprocessed`, ...).
    pub stage: String,
    /// Tool names permitted at this stage.
    #[serde(default)]
    pub permitted_tools: BTreeSet<String>,
}

impl StageSnapshot {
    /// Snapshot from a stage name and permitted tool names.
    #[must_use]
    pub fn new(stage: &str, permitted: &[&str]) -> Self {
        Self {
            stage: stage.to_string(),
            permitted_tools: permitted.iter().map(ToString::to_string).collect(),
        }
    }

    /// Whether `tool_name` is permitted.
    #[must_use]
    pub fn permits(&self, tool_name: &str) -> bool {
        self.permitted_tools.contains(tool_name)
    }
}
