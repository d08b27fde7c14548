use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::llm::{InferenceError, InferenceRequest, ReasoningEngine};

/// One scripted engine response.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Text(String),
    /// Streamed in pieces; the final text is their concatenation.
    Fragments(Vec<String>),
    Error(InferenceError),
    /// Sends the prefix as a fragment, then waits for cancellation.
    Hang(String),
}

impl ScriptStep {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    /// A response that is exactly one tool call.
    pub fn call(name: &str, parameters: Value) -> Self {
        Self::Text(serde_json::json!({ "name": name, "parameters": parameters }).to_string())
    }
}

/// Replays steps in order; once exhausted, repeats the `repeat` step if set,
/// otherwise fails as unreachable.
pub struct ScriptedEngine {
    steps: Mutex<VecDeque<ScriptStep>>,
    repeat: Option<ScriptStep>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedEngine {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns `step` forever.
    pub fn repeating(step: ScriptStep) -> Self {
        Self {
            repeat: Some(step),
            ..Self::new([])
        }
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_step(&self) -> Option<ScriptStep> {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .or_else(|| self.repeat.clone())
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    async fn generate(
        &self,
        request: InferenceRequest,
        fragments: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<String, InferenceError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        match self.next_step() {
            None => Err(InferenceError::Unreachable("script exhausted".to_string())),
            Some(ScriptStep::Error(error)) => Err(error),
            Some(ScriptStep::Text(text)) => {
                if text.trim().is_empty() {
                    Err(InferenceError::Empty)
                } else {
                    Ok(text)
                }
            }
            Some(ScriptStep::Fragments(parts)) => {
                let mut text = String::new();
                for part in parts {
                    if cancel.is_cancelled() {
                        return Err(InferenceError::Cancelled);
                    }
                    text.push_str(&part);
                    let _ = fragments.send(part).await;
                    tokio::task::yield_now().await;
                }
                Ok(text)
            }
            Some(ScriptStep::Hang(prefix)) => {
                if !prefix.is_empty() {
                    let _ = fragments.send(prefix).await;
                }
                cancel.cancelled().await;
                Err(InferenceError::Cancelled)
            }
        }
    }
}
