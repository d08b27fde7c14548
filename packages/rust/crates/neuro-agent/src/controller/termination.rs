use std::collections::BTreeMap;

use neuro_types::{ConfirmationGate, ToolExecutionRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a turn ended. Every turn ends with exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The engine answered in text without a tool call.
    Responded,
    /// The execution mode's success count was reached.
    SuccessCap,
    /// `max_iterations` was reached.
    IterationCeiling,
    /// `max_consecutive_failures` was reached.
    FailureCap,
    /// The same failing call was repeated `loop_break_threshold` times.
    LoopBreak,
    /// A call is parked until the user confirms it.
    AwaitingConfirmation,
    /// The user declined the parked call.
    ConfirmationDeclined,
    /// The consumer cancelled the turn.
    Cancelled,
    /// The reasoning engine is unreachable or answered with a hard error.
    InfrastructureError,
}

impl TerminationReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Responded => "responded",
            Self::SuccessCap => "success_cap",
            Self::IterationCeiling => "iteration_ceiling",
            Self::FailureCap => "failure_cap",
            Self::LoopBreak => "loop_break",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::ConfirmationDeclined => "confirmation_declined",
            Self::Cancelled => "cancelled",
            Self::InfrastructureError => "infrastructure_error",
        }
    }

    /// Guard trips: fatal for the turn, never retried automatically.
    #[must_use]
    pub const fn is_limit(self) -> bool {
        matches!(
            self,
            Self::IterationCeiling | Self::FailureCap | Self::LoopBreak
        )
    }
}

/// The call a turn left waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingConfirmationInfo {
    pub tool_name: String,
    pub parameters: BTreeMap<String, Value>,
    pub gate: ConfirmationGate,
    pub reason: String,
    pub signature: String,
}

/// Typed result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub reason: TerminationReason,
    /// User-visible text; for guard trips it names the limit and the last problem.
    pub final_text: String,
    pub iterations: u32,
    /// Executions dispatched during this turn, in order.
    pub dispatched: Vec<ToolExecutionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingConfirmationInfo>,
}
