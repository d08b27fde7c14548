use serde::{Deserialize, Serialize};

/// Controller state. `Idle` and `Failed` are the resting states between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    #[default]
    Idle,
    Thinking,
    Responding,
    Verifying,
    Executing,
    Observing,
    Rejected,
    Failed,
}

impl LoopState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Responding => "responding",
            Self::Verifying => "verifying",
            Self::Executing => "executing",
            Self::Observing => "observing",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    /// Resting states: awaiting input (`Idle`) or after an unrecoverable error (`Failed`).
    #[must_use]
    pub const fn is_resting(self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }

    /// Transition table. `Thinking → Thinking` is a soft-error retry; `Idle → Verifying`
    /// re-verifies a confirmed call; every active state may stop at `Idle` on a guard.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Failed, Self::Thinking | Self::Verifying)
                | (Self::Failed, Self::Idle)
                | (
                    Self::Thinking,
                    Self::Thinking | Self::Responding | Self::Verifying | Self::Failed | Self::Idle
                )
                | (Self::Responding, Self::Idle)
                | (
                    Self::Verifying,
                    Self::Executing | Self::Rejected | Self::Idle
                )
                | (Self::Executing, Self::Observing)
                | (Self::Observing | Self::Rejected, Self::Thinking | Self::Idle)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LoopState;

    #[test]
    fn execution_always_goes_through_observation() {
        assert!(LoopState::Executing.can_transition(LoopState::Observing));
        assert!(!LoopState::Executing.can_transition(LoopState::Idle));
        assert!(!LoopState::Thinking.can_transition(LoopState::Executing));
        assert!(!LoopState::Idle.can_transition(LoopState::Executing));
    }
}
