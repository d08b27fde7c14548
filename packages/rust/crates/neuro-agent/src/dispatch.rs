//! Tool dispatcher: one verified call → one `ToolExecutionRecord`.
//!
//! Handler errors, backend failures, timeouts and panics all become failure
//! records here; nothing escapes to the controller.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use neuro_types::{BackendResult, ExecutionOutcome, ToolCall, ToolDefinition, ToolExecutionRecord};
use serde_json::Value;

use crate::config::AgentConfig;
use crate::metrics::SessionMetrics;
use crate::observability::SessionEvent;
use crate::tools::{HandlerRegistry, ToolError};

/// Executes verified calls, strictly one at a time.
#[derive(Clone)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    tool_timeout: Duration,
    long_running_timeout: Duration,
    summary_max_chars: usize,
    metrics: Arc<SessionMetrics>,
}

enum HandlerOutcome {
    Returned(BackendResult),
    Failed(ToolError),
    TimedOut(Duration),
    Panicked(String),
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, config: &AgentConfig, metrics: Arc<SessionMetrics>) -> Self {
        Self {
            registry,
            tool_timeout: config.tool_timeout(false),
            long_running_timeout: config.tool_timeout(true),
            summary_max_chars: config.observation_max_chars.max(16),
            metrics,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Timeout applied to `definition`.
    pub fn timeout_for(&self, definition: &ToolDefinition) -> Duration {
        if definition.long_running {
            self.long_running_timeout
        } else {
            self.tool_timeout
        }
    }

    pub async fn dispatch(&self, call: &ToolCall, definition: &ToolDefinition) -> ToolExecutionRecord {
        let started_at = Utc::now();
        let started = Instant::now();
        let timeout = self.timeout_for(definition);
        tracing::debug!(
            event = SessionEvent::DispatchStarted.as_str(),
            tool = %call.tool_name,
            long_running = definition.long_running,
            timeout_ms = timeout.as_millis(),
            "tool dispatch started"
        );

        let outcome = match self.registry.get(&call.tool_name) {
            None => HandlerOutcome::Failed(ToolError::InvalidParameters(format!(
                "no handler bound to `{}`",
                call.tool_name
            ))),
            Some(handler) => {
                let invocation = AssertUnwindSafe(handler.invoke(call.parameters_value())).catch_unwind();
                match tokio::time::timeout(timeout, invocation).await {
                    Err(_) => HandlerOutcome::TimedOut(timeout),
                    Ok(Err(payload)) => HandlerOutcome::Panicked(panic_message(payload.as_ref())),
                    Ok(Ok(Ok(result))) => HandlerOutcome::Returned(result),
                    Ok(Ok(Err(error))) => HandlerOutcome::Failed(error),
                }
            }
        };
        let duration = started.elapsed();

        let (success, summary) = match outcome {
            HandlerOutcome::Returned(result) if result.success => {
                (true, summarize_data(result.data.as_ref()))
            }
            HandlerOutcome::Returned(result) => (
                false,
                format!(
                    "error: {}",
                    result.error.as_deref().unwrap_or("backend reported failure without detail")
                ),
            ),
            HandlerOutcome::Failed(error) => (false, format!("error: {error}")),
            HandlerOutcome::TimedOut(limit) => (
                false,
                format!("error: timed out after {}s", limit.as_secs()),
            ),
            HandlerOutcome::Panicked(message) => {
                tracing::error!(
                    event = SessionEvent::DispatchPanicked.as_str(),
                    tool = %call.tool_name,
                    panic = %message,
                    "tool handler panicked"
                );
                (false, format!("error: handler crashed: {message}"))
            }
        };

        let record = ToolExecutionRecord {
            tool_name: call.tool_name.clone(),
            parameters: call.parameters.clone(),
            call_signature: call.signature(),
            duration,
            outcome: if success {
                ExecutionOutcome::Success
            } else {
                ExecutionOutcome::Failure
            },
            output_summary: truncate_chars(&summary, self.summary_max_chars),
            long_running: definition.long_running,
            started_at,
        };
        if success {
            tracing::info!(
                event = SessionEvent::DispatchCompleted.as_str(),
                tool = %record.tool_name,
                duration_ms = duration.as_millis(),
                "tool dispatch completed"
            );
        } else {
            tracing::warn!(
                event = SessionEvent::DispatchFailed.as_str(),
                tool = %record.tool_name,
                duration_ms = duration.as_millis(),
                summary = %record.output_summary,
                "tool dispatch failed"
            );
        }
        self.metrics.record_dispatch(&record);
        record
    }
}

fn summarize_data(data: Option<&Value>) -> String {
    match data {
        None | Some(Value::Null) => "ok".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Truncate on a char boundary, marking the cut with `…`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
