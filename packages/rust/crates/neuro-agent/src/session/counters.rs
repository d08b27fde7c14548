use serde::Serialize;

/// Loop counters, reset at the start of each user message. Only the controller mutates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionCounters {
    /// Loop iterations (one inference each) in the current turn.
    pub iterations: u32,
    /// Rejections, soft engine errors and failed executions since the last success.
    pub consecutive_tool_failures: u32,
    /// Times loop detection ended a turn.
    pub loop_break_count: u32,
    /// Successful tool executions in the current turn.
    pub successful_executions: u32,
}

impl SessionCounters {
    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn record_failure(&mut self) -> u32 {
        self.consecutive_tool_failures = self.consecutive_tool_failures.saturating_add(1);
        self.consecutive_tool_failures
    }

    pub(crate) fn record_success(&mut self) -> u32 {
        self.consecutive_tool_failures = 0;
        self.successful_executions = self.successful_executions.saturating_add(1);
        self.successful_executions
    }
}
