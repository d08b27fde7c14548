/// Streak of dispatched calls that failed with the same `(tool_name, parameters)` signature.
/// Verification rejections never reach it; a success clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LoopGuard {
    signature: Option<String>,
    streak: u32,
}

impl LoopGuard {
    /// Record a failed execution; returns the current identical-failure streak.
    pub(crate) fn record_failure(&mut self, signature: &str) -> u32 {
        if self.signature.as_deref() == Some(signature) {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.signature = Some(signature.to_string());
            self.streak = 1;
        }
        self.streak
    }

    pub(crate) fn record_success(&mut self) {
        self.reset();
    }

    pub(crate) fn reset(&mut self) {
        self.signature = None;
        self.streak = 0;
    }
}
