//! Orchestration controller: the bounded plan → verify → execute → observe loop.
//!
//! The controller is the only writer of history, counters and the audit trail,
//! and the only component that ends a turn. Guards are checked at fixed points:
//! cancellation and the iteration ceiling before each inference, the failure cap
//! after each failure, loop detection after each failed execution.

mod builder;
mod confirmation;
mod events;
mod loop_guard;
mod state;
mod termination;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use neuro_types::{
    ConfirmationGate, ConversationTurn, RetrievedExample, StageSnapshot, ToolCall, ToolDefinition,
    ToolExecutionRecord, VerificationOutcome,
};
use neuro_window::HistoryWindow;
use tokio_util::sync::CancellationToken;

use crate::assembler::{ContextAssembler, Prompt};
use crate::backend::BackendFacade;
use crate::config::{AgentConfig, LowConfidenceAction};
use crate::dispatch::Dispatcher;
use crate::llm::{InferenceError, InferenceRequest, InferenceWorker};
use crate::metrics::SessionMetrics;
use crate::observability::{SessionEvent, should_surface_repeated_failure};
use crate::parser::parse_tool_call;
use crate::retrieval::ExampleRetriever;
use crate::session::SessionCounters;
use crate::tools::{ToolCatalog, VisibleTools};
use crate::verify::{ResponseShape, Verification, Verifier, contains_hedging};

use confirmation::{ConfirmationReply, PendingConfirmation, classify_reply};
use loop_guard::LoopGuard;

pub use builder::OrchestratorBuilder;
pub use events::{AgentEvent, EventSink};
pub use state::LoopState;
pub use termination::{PendingConfirmationInfo, TerminationReason, TurnOutcome};

const UNAVAILABLE_STAGE: &str = "unavailable";

enum InferenceStep {
    Text(String),
    Soft(InferenceError),
    Hard(InferenceError),
    Cancelled(String),
}

enum Step {
    Continue,
    Finish(TurnOutcome),
}

/// One session's controller. Drive it from a single task (see [`crate::spawn_session`]).
pub struct Orchestrator {
    config: AgentConfig,
    catalog: Arc<ToolCatalog>,
    backend: Arc<dyn BackendFacade>,
    worker: InferenceWorker,
    retriever: Arc<dyn ExampleRetriever>,
    assembler: ContextAssembler,
    verifier: Verifier,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<SessionMetrics>,
    history: HistoryWindow,
    counters: SessionCounters,
    guard: LoopGuard,
    state: LoopState,
    audit: Vec<ToolExecutionRecord>,
    turn_records: Vec<ToolExecutionRecord>,
    pending: Option<PendingConfirmation>,
    last_problem: Option<String>,
}

impl Orchestrator {
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Every execution of the session, oldest first.
    pub fn audit(&self) -> &[ToolExecutionRecord] {
        &self.audit
    }

    pub fn pending(&self) -> Option<PendingConfirmationInfo> {
        self.pending.as_ref().map(PendingConfirmation::info)
    }

    pub fn metrics(&self) -> Arc<SessionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle one user message. A plain yes/no while a call is parked resolves it;
    /// anything else discards the parked call and starts a fresh turn.
    pub async fn run_turn(
        &mut self,
        text: &str,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let text = text.trim();
        if let Some(pending) = self.pending.take() {
            match classify_reply(text) {
                Some(ConfirmationReply::Confirm) => {
                    return self.resolve_confirmation(pending, text, events, cancel).await;
                }
                Some(ConfirmationReply::Decline) => {
                    return self.resolve_decline(&pending, text, events);
                }
                None => {
                    tracing::info!(
                        event = SessionEvent::ConfirmationDiscarded.as_str(),
                        tool = %pending.call.tool_name,
                        "pending call discarded by a new instruction"
                    );
                    self.metrics.record_confirmation_resolved(false);
                    self.history.append(ConversationTurn::observation(
                        pending.call.tool_name.clone(),
                        format!(
                            "The pending `{}` call was not confirmed and has been discarded.",
                            pending.call.tool_name
                        ),
                    ));
                }
            }
        }

        self.begin_turn(text);
        let stage = self.fetch_stage().await;
        let visible = self.catalog.visible(&stage);
        let retrieved = if visible.is_empty() {
            // Nothing can be proposed, so no example is relevant.
            (!cancel.is_cancelled()).then(Vec::new)
        } else {
            let categories = visible.categories();
            let retriever = Arc::clone(&self.retriever);
            tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                examples = retriever.retrieve(text, &categories) => Some(examples),
            }
        };
        let Some(examples) = retrieved else {
            return self.finish(
                TerminationReason::Cancelled,
                "Turn cancelled before planning started.".to_string(),
                events,
            );
        };
        self.run_loop(&examples, events, cancel).await
    }

    /// Confirm the parked call: re-verify it against the current stage and dispatch it.
    pub async fn confirm_pending(
        &mut self,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        match self.pending.take() {
            Some(pending) => self.resolve_confirmation(pending, "yes", events, cancel).await,
            None => self.nothing_pending(events),
        }
    }

    /// Decline the parked call. Nothing is dispatched.
    pub fn decline_pending(&mut self, events: &EventSink) -> TurnOutcome {
        match self.pending.take() {
            Some(pending) => self.resolve_decline(&pending, "no", events),
            None => self.nothing_pending(events),
        }
    }

    fn begin_turn(&mut self, text: &str) {
        self.counters.reset();
        self.guard.reset();
        self.turn_records.clear();
        self.last_problem = None;
        self.metrics.record_turn();
        self.history.append(ConversationTurn::user(text));
        tracing::info!(
            event = SessionEvent::TurnStarted.as_str(),
            chars = text.chars().count(),
            history_turns = self.history.len(),
            "turn started"
        );
    }

    async fn run_loop(
        &mut self,
        examples: &[RetrievedExample],
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        loop {
            if cancel.is_cancelled() {
                return self.finish(
                    TerminationReason::Cancelled,
                    "Turn cancelled.".to_string(),
                    events,
                );
            }
            if self.counters.iterations >= self.config.max_iterations {
                let text = format!(
                    "Stopped after {} iterations without completing the request (limit {}).{}",
                    self.counters.iterations,
                    self.config.max_iterations,
                    self.last_problem_suffix()
                );
                return self.finish(TerminationReason::IterationCeiling, text, events);
            }
            self.counters.iterations = self.counters.iterations.saturating_add(1);
            self.enter(LoopState::Thinking, events, None);

            // Visibility is read fresh every iteration; the stage may have changed.
            let catalog = Arc::clone(&self.catalog);
            let stage = self.fetch_stage().await;
            let visible = catalog.visible(&stage);
            let prompt = self
                .assembler
                .assemble(&visible, examples, &self.history.snapshot());

            let response = match self.infer(prompt, events, cancel).await {
                InferenceStep::Text(text) => text,
                InferenceStep::Cancelled(partial) => {
                    self.record_partial(&partial);
                    return self.finish(
                        TerminationReason::Cancelled,
                        "Turn cancelled during generation.".to_string(),
                        events,
                    );
                }
                InferenceStep::Soft(error) => {
                    self.last_problem = Some(error.to_string());
                    let failures = self.counters.record_failure();
                    if failures >= self.config.max_consecutive_failures {
                        let text = self.failure_cap_text();
                        return self.finish(TerminationReason::FailureCap, text, events);
                    }
                    continue;
                }
                InferenceStep::Hard(error) => {
                    events.emit(AgentEvent::Error {
                        message: error.to_string(),
                    });
                    return self.finish(
                        TerminationReason::InfrastructureError,
                        format!("The reasoning engine is unavailable: {error}"),
                        events,
                    );
                }
            };

            match self
                .handle_response(&response, &visible, examples, events, cancel)
                .await
            {
                Step::Continue => {}
                Step::Finish(outcome) => return outcome,
            }
        }
    }

    async fn handle_response(
        &mut self,
        response: &str,
        visible: &VisibleTools<'_>,
        examples: &[RetrievedExample],
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Step {
        self.history.append(ConversationTurn::assistant(response));
        let parsed = parse_tool_call(response);
        let Some(call) = parsed.call.clone() else {
            tracing::debug!(
                event = SessionEvent::ParseNoCall.as_str(),
                iteration = self.counters.iterations,
                "no tool call in response"
            );
            self.enter(LoopState::Responding, events, None);
            let text = if parsed.prose.is_empty() {
                response.trim().to_string()
            } else {
                parsed.prose
            };
            return Step::Finish(self.finish(TerminationReason::Responded, text, events));
        };
        if parsed.extra_blocks > 0 {
            tracing::info!(
                event = SessionEvent::ParseExtraBlocks.as_str(),
                tool = %call.tool_name,
                ignored = parsed.extra_blocks,
                "additional tool calls in one response ignored"
            );
        }

        self.enter(LoopState::Verifying, events, Some(call.tool_name.clone()));
        let shape = ResponseShape {
            clean_output: parsed.is_clean(),
            hedging: contains_hedging(&parsed.prose),
        };
        let verification = self.verifier.verify(&call, visible, shape, None);
        let Verification { result, call } = verification;
        match result.outcome {
            VerificationOutcome::Reject => self.reject(&call, &result.reason, events),
            VerificationOutcome::NeedsConfirmation => {
                let gate = result.gate.unwrap_or(ConfirmationGate::Destructive);
                if gate == ConfirmationGate::LowConfidence
                    && self.config.low_confidence_action == LowConfidenceAction::SelfCorrect
                {
                    tracing::info!(
                        event = SessionEvent::SelfCorrectionRequested.as_str(),
                        tool = %call.tool_name,
                        confidence = result.confidence,
                        "low-confidence call sent back for self-correction"
                    );
                    let note = format!(
                        "Not executed: {}. If `{}` is what the user asked for, propose it again as a single JSON object; otherwise answer in plain text.",
                        result.reason, call.tool_name
                    );
                    return self.soft_failure(&call.tool_name, note, events);
                }
                let pending = PendingConfirmation {
                    signature: call.signature(),
                    call,
                    gate,
                    reason: result.reason,
                    shape,
                    extra_blocks: parsed.extra_blocks,
                    examples: examples.to_vec(),
                };
                Step::Finish(self.park(pending, events))
            }
            VerificationOutcome::Accept => {
                tracing::debug!(
                    event = SessionEvent::VerificationAccepted.as_str(),
                    tool = %call.tool_name,
                    confidence = result.confidence,
                    "tool call accepted"
                );
                match visible.get(&call.tool_name) {
                    Some(definition) => {
                        self.execute(&call, definition, parsed.extra_blocks, events, cancel)
                            .await
                    }
                    None => self.reject(&call, "tool is not visible", events),
                }
            }
        }
    }

    fn reject(&mut self, call: &ToolCall, reason: &str, events: &EventSink) -> Step {
        self.metrics.record_rejection();
        let streak = self.counters.consecutive_tool_failures.saturating_add(1);
        if should_surface_repeated_failure(streak) {
            tracing::warn!(
                event = SessionEvent::VerificationRejected.as_str(),
                tool = %call.tool_name,
                reason,
                failure_streak = streak,
                "tool call rejected"
            );
        } else {
            tracing::debug!(
                event = SessionEvent::VerificationRejected.as_str(),
                tool = %call.tool_name,
                reason,
                failure_streak = streak,
                "tool call rejected"
            );
        }
        let note = format!("Rejected `{}`: {reason}", call.tool_name);
        self.soft_failure(&call.tool_name, note, events)
    }

    /// Non-dispatched failure: observation for the engine, then the failure cap.
    fn soft_failure(&mut self, tool_name: &str, note: String, events: &EventSink) -> Step {
        self.enter(LoopState::Rejected, events, Some(note.clone()));
        self.history
            .append(ConversationTurn::observation(tool_name, note.clone()));
        self.last_problem = Some(note);
        let failures = self.counters.record_failure();
        if failures >= self.config.max_consecutive_failures {
            let text = self.failure_cap_text();
            return Step::Finish(self.finish(TerminationReason::FailureCap, text, events));
        }
        Step::Continue
    }

    fn park(&mut self, pending: PendingConfirmation, events: &EventSink) -> TurnOutcome {
        tracing::info!(
            event = SessionEvent::VerificationNeedsConfirmation.as_str(),
            tool = %pending.call.tool_name,
            gate = pending.gate.as_str(),
            "tool call parked for confirmation"
        );
        self.metrics.record_confirmation_requested();
        events.emit(AgentEvent::ConfirmationRequired {
            tool_name: pending.call.tool_name.clone(),
            parameters: pending.call.parameters.clone(),
            gate: pending.gate,
            reason: pending.reason.clone(),
        });
        self.history.append(ConversationTurn::observation(
            pending.call.tool_name.clone(),
            format!("Awaiting user confirmation: {}", pending.reason),
        ));
        let text = format!(
            "`{}` with {} needs your confirmation: {}. Reply \"yes\" to run it or \"no\" to cancel.",
            pending.call.tool_name,
            pending.call.parameters_value(),
            pending.reason
        );
        let info = pending.info();
        self.pending = Some(pending);
        let mut outcome = self.finish(TerminationReason::AwaitingConfirmation, text, events);
        outcome.pending = Some(info);
        outcome
    }

    async fn execute(
        &mut self,
        call: &ToolCall,
        definition: &ToolDefinition,
        extra_blocks: usize,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Step {
        self.enter(LoopState::Executing, events, Some(call.tool_name.clone()));
        events.emit(AgentEvent::ToolStarted {
            tool_name: call.tool_name.clone(),
            parameters: call.parameters.clone(),
            long_running: definition.long_running,
        });
        let dispatcher = Arc::clone(&self.dispatcher);
        let dispatched = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            record = dispatcher.dispatch(call, definition) => Some(record),
        };
        self.enter(LoopState::Observing, events, None);
        let Some(record) = dispatched else {
            self.history.append(ConversationTurn::observation(
                call.tool_name.clone(),
                "Execution was cancelled before the backend replied; backend state may have changed.",
            ));
            return Step::Finish(self.finish(
                TerminationReason::Cancelled,
                format!("Turn cancelled while `{}` was running.", call.tool_name),
                events,
            ));
        };

        self.audit.push(record.clone());
        self.turn_records.push(record.clone());
        events.emit(AgentEvent::ToolFinished {
            record: record.clone(),
        });
        let mut note = if record.succeeded() {
            format!("`{}` succeeded: {}", record.tool_name, record.output_summary)
        } else {
            format!("`{}` failed: {}", record.tool_name, record.output_summary)
        };
        if extra_blocks > 0 {
            note.push_str(&format!(
                " ({extra_blocks} additional action(s) ignored; propose one action per step.)"
            ));
        }
        self.history
            .append(ConversationTurn::observation(record.tool_name.clone(), note.clone()));

        if record.succeeded() {
            self.guard.record_success();
            let successes = self.counters.record_success();
            if successes >= self.config.success_cap() {
                let text = self.success_text();
                return Step::Finish(self.finish(TerminationReason::SuccessCap, text, events));
            }
            return Step::Continue;
        }

        self.last_problem = Some(note);
        let streak = self.guard.record_failure(&record.call_signature);
        let failures = self.counters.record_failure();
        // Loop detection is checked first so it wins when both guards trip together.
        if streak >= self.config.loop_break_threshold.max(1) {
            self.counters.loop_break_count = self.counters.loop_break_count.saturating_add(1);
            let text = format!(
                "Stopped: `{}` failed {streak} times in a row with identical parameters. Last error: {}",
                record.tool_name, record.output_summary
            );
            return Step::Finish(self.finish(TerminationReason::LoopBreak, text, events));
        }
        if failures >= self.config.max_consecutive_failures {
            let text = self.failure_cap_text();
            return Step::Finish(self.finish(TerminationReason::FailureCap, text, events));
        }
        Step::Continue
    }

    async fn resolve_confirmation(
        &mut self,
        pending: PendingConfirmation,
        text: &str,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        self.begin_turn(text);
        tracing::info!(
            event = SessionEvent::ConfirmationResolved.as_str(),
            tool = %pending.call.tool_name,
            accepted = true,
            "pending call confirmed"
        );
        self.metrics.record_confirmation_resolved(true);
        // Re-verification of the confirmed call is this turn's first iteration.
        self.counters.iterations = 1;
        self.enter(
            LoopState::Verifying,
            events,
            Some(pending.call.tool_name.clone()),
        );

        let catalog = Arc::clone(&self.catalog);
        let stage = self.fetch_stage().await;
        let visible = catalog.visible(&stage);
        let Verification { result, call } =
            self.verifier
                .verify(&pending.call, &visible, pending.shape, Some(&pending.signature));
        let step = match (result.outcome, visible.get(&call.tool_name)) {
            (VerificationOutcome::Accept, Some(definition)) => {
                self.execute(&call, definition, pending.extra_blocks, events, cancel)
                    .await
            }
            (VerificationOutcome::Reject, _) => self.reject(&call, &result.reason, events),
            _ => self.reject(
                &call,
                "the confirmed call no longer matches the current stage",
                events,
            ),
        };
        match step {
            Step::Finish(outcome) => outcome,
            Step::Continue => self.run_loop(&pending.examples, events, cancel).await,
        }
    }

    fn resolve_decline(
        &mut self,
        pending: &PendingConfirmation,
        text: &str,
        events: &EventSink,
    ) -> TurnOutcome {
        self.begin_turn(text);
        tracing::info!(
            event = SessionEvent::ConfirmationResolved.as_str(),
            tool = %pending.call.tool_name,
            accepted = false,
            "pending call declined"
        );
        self.metrics.record_confirmation_resolved(false);
        self.history.append(ConversationTurn::observation(
            pending.call.tool_name.clone(),
            format!(
                "The user declined `{}`; it was not executed.",
                pending.call.tool_name
            ),
        ));
        self.finish(
            TerminationReason::ConfirmationDeclined,
            format!("Cancelled `{}`; nothing was executed.", pending.call.tool_name),
            events,
        )
    }

    fn nothing_pending(&mut self, events: &EventSink) -> TurnOutcome {
        self.finish(
            TerminationReason::Responded,
            "There is no pending action to confirm.".to_string(),
            events,
        )
    }

    async fn fetch_stage(&self) -> StageSnapshot {
        match self.backend.stage().await {
            Ok(stage) => stage,
            Err(error) => {
                tracing::warn!(
                    event = SessionEvent::StageQueryFailed.as_str(),
                    error = %error,
                    "backend stage query failed; no tools are visible"
                );
                StageSnapshot {
                    stage: UNAVAILABLE_STAGE.to_string(),
                    permitted_tools: BTreeSet::new(),
                }
            }
        }
    }

    async fn infer(
        &self,
        prompt: Prompt,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> InferenceStep {
        let request = InferenceRequest {
            messages: prompt.messages,
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
            stream: self.config.stream,
        };
        let started = Instant::now();
        tracing::debug!(
            event = SessionEvent::InferenceStarted.as_str(),
            iteration = self.counters.iterations,
            messages = request.messages.len(),
            "inference started"
        );
        let timeout = self.config.inference_timeout();
        let mut job = self.worker.spawn(request, cancel);
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let mut partial = String::new();
        let mut streaming = true;

        let step = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    job.cancel();
                    break InferenceStep::Cancelled(partial);
                }
                () = &mut deadline => {
                    job.cancel();
                    break InferenceStep::Soft(InferenceError::Timeout(timeout));
                }
                fragment = job.fragments.recv(), if streaming => match fragment {
                    Some(fragment) => {
                        partial.push_str(&fragment);
                        events.emit(AgentEvent::PartialText { text: fragment });
                    }
                    None => streaming = false,
                },
                completion = &mut job.completion => {
                    while let Ok(fragment) = job.fragments.try_recv() {
                        partial.push_str(&fragment);
                        events.emit(AgentEvent::PartialText { text: fragment });
                    }
                    break match completion {
                        Ok(Ok(text)) => InferenceStep::Text(text),
                        Ok(Err(InferenceError::Cancelled)) => InferenceStep::Cancelled(partial),
                        Ok(Err(error)) if error.is_soft() => InferenceStep::Soft(error),
                        Ok(Err(error)) => InferenceStep::Hard(error),
                        Err(_) => InferenceStep::Hard(InferenceError::Unreachable(
                            "inference worker stopped without a result".to_string(),
                        )),
                    };
                }
            }
        };

        let elapsed_ms = started.elapsed().as_millis();
        match &step {
            InferenceStep::Text(text) => {
                self.metrics.record_inference(false);
                tracing::debug!(
                    event = SessionEvent::InferenceCompleted.as_str(),
                    elapsed_ms,
                    chars = text.chars().count(),
                    "inference completed"
                );
            }
            InferenceStep::Cancelled(partial) => {
                tracing::info!(
                    event = SessionEvent::InferenceCancelled.as_str(),
                    elapsed_ms,
                    partial_chars = partial.chars().count(),
                    "inference cancelled"
                );
            }
            InferenceStep::Soft(error) | InferenceStep::Hard(error) => {
                self.metrics.record_inference(true);
                let streak = self.counters.consecutive_tool_failures.saturating_add(1);
                if should_surface_repeated_failure(streak) || !error.is_soft() {
                    tracing::warn!(
                        event = SessionEvent::InferenceFailed.as_str(),
                        elapsed_ms,
                        soft = error.is_soft(),
                        error = %error,
                        "inference failed"
                    );
                }
            }
        }
        step
    }

    fn record_partial(&mut self, partial: &str) {
        let content = if partial.trim().is_empty() {
            "[generation cancelled]".to_string()
        } else {
            format!("{} [generation cancelled]", partial.trim_end())
        };
        self.history.append(ConversationTurn::assistant(content));
    }

    fn enter(&mut self, next: LoopState, events: &EventSink, detail: Option<String>) {
        if self.state.can_transition(next) {
            tracing::debug!(
                event = SessionEvent::StateTransition.as_str(),
                from = self.state.as_str(),
                to = next.as_str(),
                iteration = self.counters.iterations,
                "state transition"
            );
        } else {
            tracing::warn!(
                event = SessionEvent::StateTransition.as_str(),
                from = self.state.as_str(),
                to = next.as_str(),
                "unexpected state transition"
            );
        }
        self.state = next;
        events.emit(AgentEvent::StatusUpdate {
            state: next,
            iteration: self.counters.iterations,
            detail,
        });
    }

    /// The single exit of every turn.
    fn finish(
        &mut self,
        reason: TerminationReason,
        text: String,
        events: &EventSink,
    ) -> TurnOutcome {
        let resting = if reason == TerminationReason::InfrastructureError {
            LoopState::Failed
        } else {
            LoopState::Idle
        };
        if self.state != resting {
            self.enter(resting, events, Some(reason.as_str().to_string()));
        }
        self.metrics.record_termination(reason);
        if reason.is_limit() {
            tracing::warn!(
                event = SessionEvent::LoopTerminated.as_str(),
                reason = reason.as_str(),
                iterations = self.counters.iterations,
                consecutive_failures = self.counters.consecutive_tool_failures,
                "turn stopped by a loop guard"
            );
        } else {
            tracing::info!(
                event = SessionEvent::TurnCompleted.as_str(),
                reason = reason.as_str(),
                iterations = self.counters.iterations,
                dispatched = self.turn_records.len(),
                "turn completed"
            );
        }
        events.emit(AgentEvent::FinalText {
            text: text.clone(),
            reason,
        });
        TurnOutcome {
            reason,
            final_text: text,
            iterations: self.counters.iterations,
            dispatched: std::mem::take(&mut self.turn_records),
            pending: None,
        }
    }

    fn failure_cap_text(&self) -> String {
        format!(
            "Stopped after {} consecutive failed attempts (limit {}).{}",
            self.counters.consecutive_tool_failures,
            self.config.max_consecutive_failures,
            self.last_problem_suffix()
        )
    }

    fn last_problem_suffix(&self) -> String {
        self.last_problem
            .as_ref()
            .map(|problem| format!(" Last problem: {problem}"))
            .unwrap_or_default()
    }

    fn success_text(&self) -> String {
        let done: Vec<String> = self
            .turn_records
            .iter()
            .filter(|record| record.succeeded())
            .map(|record| format!("`{}`: {}", record.tool_name, record.output_summary))
            .collect();
        format!("Done. {}", done.join("; "))
    }
}
