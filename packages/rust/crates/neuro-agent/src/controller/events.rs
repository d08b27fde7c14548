//! Consumer-facing turn events.

use std::collections::BTreeMap;

use neuro_types::{ConfirmationGate, ToolExecutionRecord};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use super::state::LoopState;
use super::termination::TerminationReason;

/// One event of a running turn, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The controller entered `state`.
    StatusUpdate {
        state: LoopState,
        iteration: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// Streamed engine fragment.
    PartialText { text: String },
    /// Last event of every turn.
    FinalText {
        text: String,
        reason: TerminationReason,
    },
    ToolStarted {
        tool_name: String,
        parameters: BTreeMap<String, Value>,
        long_running: bool,
    },
    ToolFinished { record: ToolExecutionRecord },
    /// A call is parked until the user confirms or declines it.
    ConfirmationRequired {
        tool_name: String,
        parameters: BTreeMap<String, Value>,
        gate: ConfirmationGate,
        reason: String,
    },
    Error { message: String },
}

impl AgentEvent {
    /// Whether this event ends the turn's stream.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self, Self::FinalText { .. })
    }
}

/// Sender side of a turn's event stream. A dropped receiver is not an error.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl EventSink {
    /// Sink plus the receiver the consumer reads from.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Sink that drops every event.
    #[must_use]
    pub fn discard() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: AgentEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
