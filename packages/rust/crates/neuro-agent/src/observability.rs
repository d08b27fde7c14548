//! Structured event names for `tracing` fields (`event = SessionEvent::X.as_str()`).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    SessionSpawned,
    TurnStarted,
    TurnCompleted,
    StateTransition,
    StageQueryFailed,
    RetrievalCompleted,
    RetrievalDegraded,
    EmbeddingCompleted,
    EmbeddingFailed,
    InferenceStarted,
    InferenceCompleted,
    InferenceFailed,
    InferenceCancelled,
    ParseNoCall,
    ParseExtraBlocks,
    VerificationAccepted,
    VerificationRejected,
    VerificationNeedsConfirmation,
    SelfCorrectionRequested,
    ConfirmationResolved,
    ConfirmationDiscarded,
    DispatchStarted,
    DispatchCompleted,
    DispatchFailed,
    DispatchPanicked,
    LoopTerminated,
    RegistryValidated,
}

impl SessionEvent {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::SessionSpawned => "agent.session.spawned",
            Self::TurnStarted => "agent.turn.started",
            Self::TurnCompleted => "agent.turn.completed",
            Self::StateTransition => "agent.state.transition",
            Self::StageQueryFailed => "agent.stage.query_failed",
            Self::RetrievalCompleted => "agent.retrieval.completed",
            Self::RetrievalDegraded => "agent.retrieval.degraded",
            Self::EmbeddingCompleted => "agent.embedding.completed",
            Self::EmbeddingFailed => "agent.embedding.failed",
            Self::InferenceStarted => "agent.inference.started",
            Self::InferenceCompleted => "agent.inference.completed",
            Self::InferenceFailed => "agent.inference.failed",
            Self::InferenceCancelled => "agent.inference.cancelled",
            Self::ParseNoCall => "agent.parse.no_call",
            Self::ParseExtraBlocks => "agent.parse.extra_blocks",
            Self::VerificationAccepted => "agent.verification.accepted",
            Self::VerificationRejected => "agent.verification.rejected",
            Self::VerificationNeedsConfirmation => "agent.verification.needs_confirmation",
            Self::SelfCorrectionRequested => "agent.verification.self_correction",
            Self::ConfirmationResolved => "agent.confirmation.resolved",
            Self::ConfirmationDiscarded => "agent.confirmation.discarded",
            Self::DispatchStarted => "agent.dispatch.started",
            Self::DispatchCompleted => "agent.dispatch.completed",
            Self::DispatchFailed => "agent.dispatch.failed",
            Self::DispatchPanicked => "agent.dispatch.panicked",
            Self::LoopTerminated => "agent.loop.terminated",
            Self::RegistryValidated => "agent.registry.validated",
        }
    }
}

const REPEATED_FAILURE_LOG_EVERY: u32 = 20;

/// Surface the 1st, 2nd, 4th, 8th and 16th failure of a streak, then every 20th.
pub(crate) fn should_surface_repeated_failure(failure_streak: u32) -> bool {
    matches!(failure_streak, 1 | 2 | 4 | 8 | 16)
        || failure_streak.is_multiple_of(REPEATED_FAILURE_LOG_EVERY)
}

#[cfg(test)]
mod tests {
    use super::should_surface_repeated_failure;

    #[test]
    fn repeated_failures_are_sampled() {
        let surfaced: Vec<u32> = (1..=45)
            .filter(|streak| should_surface_repeated_failure(*streak))
            .collect();
        assert_eq!(surfaced, vec![1, 2, 4, 8, 16, 20, 40]);
    }
}
