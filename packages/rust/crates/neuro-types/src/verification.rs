//! Verification results: computed fresh per tool call, never cached.

use serde::{Deserialize, Serialize};

/// Gate decision for one tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Dispatch may proceed.
    Accept,
    /// Structurally or semantically invalid.
    Reject,
    /// Valid, but a human must confirm before dispatch.
    NeedsConfirmation,
}

impl VerificationOutcome {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::NeedsConfirmation => "needs_confirmation",
        }
    }
}

/// Which gate asked for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationGate {
    /// Tool is flagged destructive.
    Destructive,
    /// Heuristic confidence fell below the threshold.
    LowConfidence,
    /// Both of the above.
    Both,
}

impl ConfirmationGate {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Destructive => "destructive",
            Self::LowConfidence => "low_confidence",
            Self::Both => "both",
        }
    }

    /// Combine the two independent gates.
    #[must_use]
    pub const fn from_flags(destructive: bool, low_confidence: bool) -> Option<Self> {
        match (destructive, low_confidence) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Destructive),
            (false, true) => Some(Self::LowConfidence),
            (false, false) => None,
        }
    }

    /// Whether the destructive gate is part of this decision.
    #[must_use]
    pub const fn involves_destructive(self) -> bool {
        matches!(self, Self::Destructive | Self::Both)
    }
}

/// Outcome, human-readable reason and heuristic confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Gate decision.
    pub outcome: VerificationOutcome,
    /// Why; fed back to the reasoning engine on reject / confirmation.
    pub reason: String,
    /// Heuristic confidence, clamped to `[0, 1]`.
    pub confidence: f32,
    /// Set when `outcome` is `NeedsConfirmation`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<ConfirmationGate>,
}

impl VerificationResult {
    /// Accepted call.
    #[must_use]
    pub fn accept(confidence: f32, reason: impl Into<String>) -> Self {
        Self {
            outcome: VerificationOutcome::Accept,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
            gate: None,
        }
    }

    /// Rejected call.
    #[must_use]
    pub fn reject(confidence: f32, reason: impl Into<String>) -> Self {
        Self {
            outcome: VerificationOutcome::Reject,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
            gate: None,
        }
    }

    /// Call parked until a human confirms it.
    #[must_use]
    pub fn needs_confirmation(
        gate: ConfirmationGate,
        confidence: f32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            outcome: VerificationOutcome::NeedsConfirmation,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
            gate: Some(gate),
        }
    }

    /// Only `Accept` may be dispatched.
    #[must_use]
    pub fn is_dispatchable(&self) -> bool {
        self.outcome == VerificationOutcome::Accept
    }
}
