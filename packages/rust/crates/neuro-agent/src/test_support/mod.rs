//! Test doubles shared by the integration tests: a scripted reasoning engine,
//! an in-memory EEG backend with stage transitions, and a fixed retriever.

mod backend;
mod engine;
mod retriever;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::AgentConfig;
use crate::controller::{AgentEvent, Orchestrator};
use crate::tools::RegistryError;

pub use backend::EegBackendSim;
pub use engine::{ScriptStep, ScriptedEngine};
pub use retriever::StaticRetriever;

/// Defaults with batched inference and short timeouts.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        stream: false,
        inference_timeout_secs: 5,
        tool_timeout_secs: 5,
        long_running_tool_timeout_secs: 10,
        ..AgentConfig::default()
    }
}

/// Orchestrator over the EEG catalog, the simulator and a scripted engine.
pub fn sim_orchestrator(
    config: AgentConfig,
    engine: &Arc<ScriptedEngine>,
    backend: &Arc<EegBackendSim>,
) -> Result<Orchestrator, RegistryError> {
    Orchestrator::builder(config, backend.clone(), engine.clone()).build()
}

/// Drain a turn's stream up to and including its `FinalText`.
pub async fn collect_events(mut receiver: UnboundedReceiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        let last = event.is_final();
        events.push(event);
        if last {
            break;
        }
    }
    events
}
