use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use neuro_types::ToolExecutionRecord;
use serde::Serialize;

use crate::controller::TerminationReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DispatchLatencyBucketsSnapshot {
    pub le_100ms: u64,
    pub le_1s: u64,
    pub le_10s: u64,
    pub le_60s: u64,
    pub gt_60s: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ToolLatencySnapshot {
    pub count: u64,
    pub failures: u64,
    pub total_ms: u64,
    pub max_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetricsSnapshot {
    pub captured_at_unix_ms: u64,
    pub turns_total: u64,
    pub inferences_total: u64,
    pub inference_failures_total: u64,
    pub rejections_total: u64,
    pub confirmations_requested_total: u64,
    pub confirmations_accepted_total: u64,
    pub confirmations_declined_total: u64,
    pub dispatches_total: u64,
    pub dispatch_failures_total: u64,
    pub dispatch_duration_ms_total: u64,
    pub avg_dispatch_duration_ms: f32,
    pub dispatch_success_rate: f32,
    pub terminations: BTreeMap<String, u64>,
    pub tools: BTreeMap<String, ToolLatencySnapshot>,
    pub latency_buckets: DispatchLatencyBucketsSnapshot,
}

#[derive(Debug, Clone, Default)]
struct SessionMetricsState {
    turns_total: u64,
    inferences_total: u64,
    inference_failures_total: u64,
    rejections_total: u64,
    confirmations_requested_total: u64,
    confirmations_accepted_total: u64,
    confirmations_declined_total: u64,
    dispatches_total: u64,
    dispatch_failures_total: u64,
    dispatch_duration_ms_total: u64,
    terminations: BTreeMap<String, u64>,
    tools: BTreeMap<String, ToolLatencySnapshot>,
    latency_buckets: DispatchLatencyBucketsSnapshot,
}

impl SessionMetricsState {
    fn observe_dispatch(&mut self, record: &ToolExecutionRecord) {
        let duration_ms = duration_ms(record.duration);
        self.dispatches_total = self.dispatches_total.saturating_add(1);
        self.dispatch_duration_ms_total = self.dispatch_duration_ms_total.saturating_add(duration_ms);
        let tool = self.tools.entry(record.tool_name.clone()).or_default();
        tool.count = tool.count.saturating_add(1);
        tool.total_ms = tool.total_ms.saturating_add(duration_ms);
        tool.max_ms = tool.max_ms.max(duration_ms);
        if !record.succeeded() {
            tool.failures = tool.failures.saturating_add(1);
            self.dispatch_failures_total = self.dispatch_failures_total.saturating_add(1);
        }
        self.observe_latency_bucket(duration_ms);
    }

    fn observe_latency_bucket(&mut self, duration_ms: u64) {
        if duration_ms <= 100 {
            self.latency_buckets.le_100ms = self.latency_buckets.le_100ms.saturating_add(1);
        } else if duration_ms <= 1_000 {
            self.latency_buckets.le_1s = self.latency_buckets.le_1s.saturating_add(1);
        } else if duration_ms <= 10_000 {
            self.latency_buckets.le_10s = self.latency_buckets.le_10s.saturating_add(1);
        } else if duration_ms <= 60_000 {
            self.latency_buckets.le_60s = self.latency_buckets.le_60s.saturating_add(1);
        } else {
            self.latency_buckets.gt_60s = self.latency_buckets.gt_60s.saturating_add(1);
        }
    }

    fn snapshot(&self) -> SessionMetricsSnapshot {
        let successes = self
            .dispatches_total
            .saturating_sub(self.dispatch_failures_total);
        SessionMetricsSnapshot {
            captured_at_unix_ms: now_unix_ms(),
            turns_total: self.turns_total,
            inferences_total: self.inferences_total,
            inference_failures_total: self.inference_failures_total,
            rejections_total: self.rejections_total,
            confirmations_requested_total: self.confirmations_requested_total,
            confirmations_accepted_total: self.confirmations_accepted_total,
            confirmations_declined_total: self.confirmations_declined_total,
            dispatches_total: self.dispatches_total,
            dispatch_failures_total: self.dispatch_failures_total,
            dispatch_duration_ms_total: self.dispatch_duration_ms_total,
            avg_dispatch_duration_ms: ratio_as_f32(
                self.dispatch_duration_ms_total,
                self.dispatches_total,
            ),
            dispatch_success_rate: ratio_as_f32(successes, self.dispatches_total),
            terminations: self.terminations.clone(),
            tools: self.tools.clone(),
            latency_buckets: self.latency_buckets,
        }
    }
}

/// Process-lifetime counters for one session. Cheap to update from the controller.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    state: Mutex<SessionMetricsState>,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SessionMetricsState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub(crate) fn record_turn(&self) {
        let mut state = self.state();
        state.turns_total = state.turns_total.saturating_add(1);
    }

    pub(crate) fn record_inference(&self, failed: bool) {
        let mut state = self.state();
        state.inferences_total = state.inferences_total.saturating_add(1);
        if failed {
            state.inference_failures_total = state.inference_failures_total.saturating_add(1);
        }
    }

    pub(crate) fn record_rejection(&self) {
        let mut state = self.state();
        state.rejections_total = state.rejections_total.saturating_add(1);
    }

    pub(crate) fn record_confirmation_requested(&self) {
        let mut state = self.state();
        state.confirmations_requested_total = state.confirmations_requested_total.saturating_add(1);
    }

    pub(crate) fn record_confirmation_resolved(&self, accepted: bool) {
        let mut state = self.state();
        if accepted {
            state.confirmations_accepted_total = state.confirmations_accepted_total.saturating_add(1);
        } else {
            state.confirmations_declined_total = state.confirmations_declined_total.saturating_add(1);
        }
    }

    pub(crate) fn record_dispatch(&self, record: &ToolExecutionRecord) {
        self.state().observe_dispatch(record);
    }

    pub(crate) fn record_termination(&self, reason: TerminationReason) {
        let mut state = self.state();
        let count = state
            .terminations
            .entry(reason.as_str().to_string())
            .or_insert(0);
        *count = count.saturating_add(1);
    }

    pub fn snapshot(&self) -> SessionMetricsSnapshot {
        self.state().snapshot()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[allow(clippy::cast_precision_loss)]
fn ratio_as_f32(numerator: u64, denominator: u64) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_ms)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use neuro_types::ExecutionOutcome;

    use super::*;

    fn record(tool: &str, ms: u64, outcome: ExecutionOutcome) -> ToolExecutionRecord {
        ToolExecutionRecord {
            tool_name: tool.to_string(),
            parameters: BTreeMap::new(),
            call_signature: String::new(),
            duration: Duration::from_millis(ms),
            outcome,
            output_summary: String::new(),
            long_running: false,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn dispatches_fill_per_tool_and_bucket_counters() {
        let metrics = SessionMetrics::new();
        metrics.record_dispatch(&record("apply_filter", 40, ExecutionOutcome::Success));
        metrics.record_dispatch(&record("apply_filter", 2_500, ExecutionOutcome::Failure));
        metrics.record_dispatch(&record("run_training", 90_000, ExecutionOutcome::Success));
        metrics.record_termination(TerminationReason::SuccessCap);
        metrics.record_termination(TerminationReason::SuccessCap);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dispatches_total, 3);
        assert_eq!(snapshot.dispatch_failures_total, 1);
        let filter = snapshot.tools["apply_filter"];
        assert_eq!(filter.count, 2);
        assert_eq!(filter.failures, 1);
        assert_eq!(filter.max_ms, 2_500);
        assert_eq!(snapshot.latency_buckets.le_100ms, 1);
        assert_eq!(snapshot.latency_buckets.le_10s, 1);
        assert_eq!(snapshot.latency_buckets.gt_60s, 1);
        assert_eq!(snapshot.terminations["success_cap"], 2);
    }
}
