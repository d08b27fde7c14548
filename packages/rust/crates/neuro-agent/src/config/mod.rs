//! Config namespace: agent config and YAML runtime settings.

mod agent;
mod settings;

pub use agent::{
    AgentConfig, DEFAULT_BACKEND_URL, DEFAULT_INFERENCE_URL, ExecutionMode, LowConfidenceAction,
    RetrievalConfig,
};
pub use settings::{
    BackendSettings, HistorySettings, InferenceSettings, LoopSettings, RetrievalSettings,
    RuntimeSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
