//! Agent orchestration core for the EEG workbench.
//!
//! - **Loop**: user message → retrieval → prompt → inference → parse → verify → dispatch → observe, bounded by iteration, failure and loop-detection guards.
//! - **Seams**: reasoning engine ([`ReasoningEngine`]), backend facade ([`BackendFacade`]), example retrieval ([`ExampleRetriever`]), typed tool handlers ([`ToolHandler`]).
//! - **Surfaces**: [`SessionHandle`] event streams, the stdio line protocol, the `neuro-agent` CLI.

#![allow(missing_docs)]

mod assembler;
mod backend;
mod config;
mod controller;
mod dispatch;
mod embedding;
mod gateway;
mod handle;
mod llm;
mod metrics;
mod observability;
mod parser;
mod retrieval;
mod session;
#[doc(hidden)]
pub mod test_support;
mod tools;
mod verify;

pub use assembler::{ContextAssembler, Prompt};
pub use backend::{BackendError, BackendFacade, HttpBackend};
pub use config::{
    AgentConfig, BackendSettings, DEFAULT_BACKEND_URL, DEFAULT_INFERENCE_URL, ExecutionMode,
    HistorySettings, InferenceSettings, LoopSettings, LowConfidenceAction, RetrievalConfig,
    RetrievalSettings, RuntimeSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
pub use controller::{
    AgentEvent, EventSink, LoopState, Orchestrator, OrchestratorBuilder, PendingConfirmationInfo,
    TerminationReason, TurnOutcome,
};
pub use dispatch::Dispatcher;
pub use embedding::EmbeddingClient;
pub use gateway::{STDIO_CANCEL_COMMAND, run_stdio};
pub use handle::{SessionError, SessionHandle, spawn_session};
pub use llm::{
    HttpReasoningEngine, InferenceError, InferenceJob, InferenceRequest, InferenceWorker,
    ReasoningEngine,
};
pub use metrics::{
    DispatchLatencyBucketsSnapshot, SessionMetrics, SessionMetricsSnapshot, ToolLatencySnapshot,
};
pub use parser::{ParseOutcome, parse_tool_call};
pub use retrieval::{ExampleRetriever, NoRetrieval, Retriever};
pub use session::{ChatMessage, SessionCounters};
pub use tools::{
    ApplyFilterParams, ApplyNotchParams, ConfigureTrainingParams, HandlerRegistry, LoadDataParams,
    NoParams, RegistryError, ResampleParams, SetModelParams, ToolCatalog, ToolError, ToolHandler,
    TypedHandler, VisibleTools, VisualizeParams, decode_params, eeg_catalog, eeg_handlers,
};
pub use verify::{
    ConfidenceSignals, ResponseShape, Validator, ValidatorSet, Verification, Verifier,
    contains_hedging, frequency_range, non_empty_path, positive_integers, positive_number,
    probability_ranges,
};
