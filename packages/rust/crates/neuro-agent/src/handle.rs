//! Consumer-facing session handle: the controller runs on its own task; turns are
//! submitted over a channel and report back as an event stream.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::controller::{AgentEvent, EventSink, Orchestrator};
use crate::metrics::{SessionMetrics, SessionMetricsSnapshot};
use crate::observability::SessionEvent;

const COMMAND_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session task has stopped")]
    Closed,
}

enum SessionCommand {
    Submit {
        text: String,
        events: EventSink,
        cancel: CancellationToken,
    },
    Confirm {
        events: EventSink,
        cancel: CancellationToken,
    },
    Decline {
        events: EventSink,
    },
}

impl SessionCommand {
    fn cancel_token(&self) -> CancellationToken {
        match self {
            Self::Submit { cancel, .. } | Self::Confirm { cancel, .. } => cancel.clone(),
            Self::Decline { .. } => CancellationToken::new(),
        }
    }
}

/// Cheap to clone; every clone drives the same session. Turns run strictly in
/// submission order.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    commands: mpsc::Sender<SessionCommand>,
    /// Token of the command the session task is executing.
    current_turn: Arc<Mutex<CancellationToken>>,
    metrics: Arc<SessionMetrics>,
}

/// Move `orchestrator` onto its own task and return a handle to it.
pub fn spawn_session(orchestrator: Orchestrator) -> SessionHandle {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (commands, mut inbox) = mpsc::channel::<SessionCommand>(COMMAND_QUEUE_CAPACITY);
    let metrics = orchestrator.metrics();
    tracing::info!(
        event = SessionEvent::SessionSpawned.as_str(),
        session_id = %session_id,
        tools = orchestrator.catalog().len(),
        mode = orchestrator.config().execution_mode.as_str(),
        "agent session spawned"
    );

    let current_turn = Arc::new(Mutex::new(CancellationToken::new()));
    let running = Arc::clone(&current_turn);
    let mut orchestrator = orchestrator;
    tokio::spawn(async move {
        while let Some(command) = inbox.recv().await {
            *running.lock().unwrap_or_else(PoisonError::into_inner) = command.cancel_token();
            match command {
                SessionCommand::Submit {
                    text,
                    events,
                    cancel,
                } => {
                    orchestrator.run_turn(&text, &events, &cancel).await;
                }
                SessionCommand::Confirm { events, cancel } => {
                    orchestrator.confirm_pending(&events, &cancel).await;
                }
                SessionCommand::Decline { events } => {
                    orchestrator.decline_pending(&events);
                }
            }
        }
    });

    SessionHandle {
        session_id,
        commands,
        current_turn,
        metrics,
    }
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Queue one user message. The stream ends after its `FinalText` event.
    pub async fn submit(
        &self,
        text: impl Into<String>,
    ) -> Result<mpsc::UnboundedReceiver<AgentEvent>, SessionError> {
        let (events, receiver) = EventSink::channel();
        let cancel = CancellationToken::new();
        self.send(SessionCommand::Submit {
            text: text.into(),
            events,
            cancel,
        })
        .await?;
        Ok(receiver)
    }

    /// Confirm the parked call.
    pub async fn confirm(&self) -> Result<mpsc::UnboundedReceiver<AgentEvent>, SessionError> {
        let (events, receiver) = EventSink::channel();
        let cancel = CancellationToken::new();
        self.send(SessionCommand::Confirm { events, cancel }).await?;
        Ok(receiver)
    }

    /// Decline the parked call.
    pub async fn decline(&self) -> Result<mpsc::UnboundedReceiver<AgentEvent>, SessionError> {
        let (events, receiver) = EventSink::channel();
        self.send(SessionCommand::Decline { events }).await?;
        Ok(receiver)
    }

    /// Cancel the turn that is running now. Queued turns are unaffected.
    pub fn cancel(&self) {
        self.current_turn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    pub fn metrics(&self) -> SessionMetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}
