//! Append-only audit records of tool executions.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether the backend call succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Backend reported success.
    Success,
    /// Backend reported an error, the handler failed, timed out or panicked.
    Failure,
}

impl ExecutionOutcome {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// One tool execution. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionRecord {
    /// Executed tool.
    pub tool_name: String,
    /// Parameters it was called with.
    pub parameters: BTreeMap<String, Value>,
    /// `ToolCall::signature` of the executed call.
    pub call_signature: String,
    /// Wall-clock duration of the handler.
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    /// Success or failure.
    pub outcome: ExecutionOutcome,
    /// Truncated, human-readable result or error.
    pub output_summary: String,
    /// Whether long-running timeout semantics applied.
    #[serde(default)]
    pub long_running: bool,
    /// When dispatch started.
    pub started_at: DateTime<Utc>,
}

impl ToolExecutionRecord {
    /// Whether the execution succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcome == ExecutionOutcome::Success
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
