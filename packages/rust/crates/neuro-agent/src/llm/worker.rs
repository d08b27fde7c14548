//! Inference worker: one background task per inference, SPSC fragment channel, oneshot completion.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::{InferenceError, InferenceRequest, ReasoningEngine};

const FRAGMENT_CHANNEL_CAPACITY: usize = 128;

/// Runs inferences off the control path.
#[derive(Clone)]
pub struct InferenceWorker {
    engine: Arc<dyn ReasoningEngine>,
}

/// Handle to one in-flight inference. Dropping it cancels the inference.
pub struct InferenceJob {
    /// Incremental text fragments; closed when generation ends.
    pub fragments: mpsc::Receiver<String>,
    /// Final text or error.
    pub completion: oneshot::Receiver<Result<String, InferenceError>>,
    cancel: CancellationToken,
}

impl InferenceWorker {
    pub fn new(engine: Arc<dyn ReasoningEngine>) -> Self {
        Self { engine }
    }

    /// Spawn one inference. `parent` cancels it together with its turn.
    pub fn spawn(&self, request: InferenceRequest, parent: &CancellationToken) -> InferenceJob {
        let (fragment_tx, fragment_rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        let (done_tx, done_rx) = oneshot::channel();
        let cancel = parent.child_token();
        let engine = Arc::clone(&self.engine);
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let result = engine.generate(request, fragment_tx, task_cancel).await;
            let _ = done_tx.send(result);
        });
        InferenceJob {
            fragments: fragment_rx,
            completion: done_rx,
            cancel,
        }
    }
}

impl InferenceJob {
    /// Ask the engine to stop producing output.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for InferenceJob {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
