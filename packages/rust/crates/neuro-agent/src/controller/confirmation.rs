//! Parked calls and plain yes/no replies to them.

use neuro_types::{ConfirmationGate, RetrievedExample, ToolCall};

use super::termination::PendingConfirmationInfo;
use crate::verify::ResponseShape;

#[derive(Debug, Clone)]
pub(crate) struct PendingConfirmation {
    pub(crate) call: ToolCall,
    pub(crate) signature: String,
    pub(crate) gate: ConfirmationGate,
    pub(crate) reason: String,
    pub(crate) shape: ResponseShape,
    pub(crate) extra_blocks: usize,
    /// Examples of the turn that proposed the call; reused when the loop resumes.
    pub(crate) examples: Vec<RetrievedExample>,
}

impl PendingConfirmation {
    pub(crate) fn info(&self) -> PendingConfirmationInfo {
        PendingConfirmationInfo {
            tool_name: self.call.tool_name.clone(),
            parameters: self.call.parameters.clone(),
            gate: self.gate,
            reason: self.reason.clone(),
            signature: self.signature.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfirmationReply {
    Confirm,
    Decline,
}

const AFFIRMATIVE: &[&str] = &[
    "y", "yes", "yeah", "yep", "ok", "okay", "sure", "confirm", "confirmed", "go ahead",
    "proceed", "do it", "yes please", "yes, do it",
];
const NEGATIVE: &[&str] = &[
    "n", "no", "nope", "cancel", "stop", "abort", "decline", "don't", "do not", "no thanks",
    "no, cancel",
];

/// Exact plain replies only; anything else is a new instruction.
pub(crate) fn classify_reply(text: &str) -> Option<ConfirmationReply> {
    let normalized = text
        .trim()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_ascii_lowercase();
    if AFFIRMATIVE.contains(&normalized.as_str()) {
        Some(ConfirmationReply::Confirm)
    } else if NEGATIVE.contains(&normalized.as_str()) {
        Some(ConfirmationReply::Decline)
    } else {
        None
    }
}
