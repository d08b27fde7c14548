//! Layered YAML settings: the system file ships with the repo, the user file
//! lives under `$PRJ_CONFIG_HOME/neuro-agent/` and wins field by field.
//! [`RuntimeSettings::apply_to`] then lays the result over [`AgentConfig::default`].

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

use super::agent::{AgentConfig, ExecutionMode, LowConfidenceAction};

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "packages/conf/settings.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "neuro-agent/settings.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";
static CONFIG_HOME_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeSettings {
    #[serde(default)]
    pub agent: LoopSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub backend: BackendSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoopSettings {
    pub max_iterations: Option<u32>,
    pub max_consecutive_failures: Option<u32>,
    pub loop_break_threshold: Option<u32>,
    pub execution_mode: Option<String>,
    pub multi_action_max_successes: Option<u32>,
    pub confidence_threshold: Option<f32>,
    pub low_confidence_action: Option<String>,
    pub observation_max_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: Option<usize>,
    pub hybrid_weight: Option<f32>,
    pub min_score: Option<f32>,
    pub corpus_path: Option<String>,
    pub embedding_base_url: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_dim: Option<usize>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistorySettings {
    pub window_max_turns: Option<usize>,
    pub token_budget: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InferenceSettings {
    pub url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub stream: Option<bool>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendSettings {
    pub url: Option<String>,
    pub tool_timeout_secs: Option<u64>,
    pub long_running_tool_timeout_secs: Option<u64>,
}

impl RuntimeSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            agent: self.agent.merge(overlay.agent),
            retrieval: self.retrieval.merge(overlay.retrieval),
            history: self.history.merge(overlay.history),
            inference: self.inference.merge(overlay.inference),
            backend: self.backend.merge(overlay.backend),
        }
    }

    /// Apply every configured field over `config`. Invalid values are ignored with a warning.
    pub fn apply_to(&self, config: &mut AgentConfig) {
        let agent = &self.agent;
        if let Some(value) = positive_u32(agent.max_iterations, "agent.max_iterations") {
            config.max_iterations = value;
        }
        if let Some(value) = positive_u32(
            agent.max_consecutive_failures,
            "agent.max_consecutive_failures",
        ) {
            config.max_consecutive_failures = value;
        }
        if let Some(value) = positive_u32(agent.loop_break_threshold, "agent.loop_break_threshold")
        {
            config.loop_break_threshold = value;
        }
        if !config.loop_break_reachable() {
            tracing::warn!(
                loop_break_threshold = config.loop_break_threshold,
                max_consecutive_failures = config.max_consecutive_failures,
                "loop_break_threshold exceeds max_consecutive_failures; the failure cap always stops first"
            );
        }
        if let Some(raw) = non_empty(agent.execution_mode.as_deref()) {
            match ExecutionMode::parse(raw) {
                Some(mode) => config.execution_mode = mode,
                None => warn_invalid("agent.execution_mode", raw, "single, multi"),
            }
        }
        if let Some(value) = positive_u32(
            agent.multi_action_max_successes,
            "agent.multi_action_max_successes",
        ) {
            config.multi_action_max_successes = value;
        }
        if let Some(value) = unit_f32(agent.confidence_threshold, "agent.confidence_threshold") {
            config.confidence_threshold = value;
        }
        if let Some(raw) = non_empty(agent.low_confidence_action.as_deref()) {
            match LowConfidenceAction::parse(raw) {
                Some(action) => config.low_confidence_action = action,
                None => warn_invalid("agent.low_confidence_action", raw, "confirm, self_correct"),
            }
        }
        if let Some(value) = agent.observation_max_chars.filter(|v| *v > 0) {
            config.observation_max_chars = value;
        }

        let retrieval = &self.retrieval;
        if let Some(value) = retrieval.top_k {
            config.retrieval.top_k = value;
        }
        if let Some(value) = unit_f32(retrieval.hybrid_weight, "retrieval.hybrid_weight") {
            config.retrieval.hybrid_weight = Some(value);
        }
        if let Some(value) = retrieval.min_score {
            config.retrieval.min_score = value;
        }
        if let Some(path) = non_empty(retrieval.corpus_path.as_deref()) {
            config.retrieval.corpus_path = Some(PathBuf::from(path));
        }
        if let Some(url) = non_empty(retrieval.embedding_base_url.as_deref()) {
            config.retrieval.embedding_base_url = Some(url.to_string());
        }
        if let Some(model) = non_empty(retrieval.embedding_model.as_deref()) {
            config.retrieval.embedding_model = Some(model.to_string());
        }
        if let Some(value) = retrieval.embedding_dim.filter(|v| *v > 0) {
            config.retrieval.embedding_dim = value;
        }
        if let Some(value) = retrieval.timeout_ms.filter(|v| *v > 0) {
            config.retrieval.timeout_ms = value;
        }

        if let Some(value) = self.history.window_max_turns.filter(|v| *v > 0) {
            config.window_max_turns = value;
        }
        if let Some(value) = self.history.token_budget.filter(|v| *v > 0) {
            config.history_token_budget = Some(value);
        }

        let inference = &self.inference;
        if let Some(url) = non_empty(inference.url.as_deref()) {
            config.inference_url = url.to_string();
        }
        if let Some(model) = non_empty(inference.model.as_deref()) {
            config.model = model.to_string();
        }
        if let Some(value) = inference.temperature.filter(|v| (0.0..=2.0).contains(v)) {
            config.temperature = value;
        }
        if let Some(value) = inference.max_output_tokens.filter(|v| *v > 0) {
            config.max_output_tokens = value;
        }
        if let Some(value) = inference.stream {
            config.stream = value;
        }
        if let Some(value) = inference.timeout_secs.filter(|v| *v > 0) {
            config.inference_timeout_secs = value;
        }

        let backend = &self.backend;
        if let Some(url) = non_empty(backend.url.as_deref()) {
            config.backend_url = url.to_string();
        }
        if let Some(value) = backend.tool_timeout_secs.filter(|v| *v > 0) {
            config.tool_timeout_secs = value;
        }
        if let Some(value) = backend.long_running_tool_timeout_secs.filter(|v| *v > 0) {
            config.long_running_tool_timeout_secs = value;
        }
    }
}

impl LoopSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            max_iterations: overlay.max_iterations.or(self.max_iterations),
            max_consecutive_failures: overlay
                .max_consecutive_failures
                .or(self.max_consecutive_failures),
            loop_break_threshold: overlay.loop_break_threshold.or(self.loop_break_threshold),
            execution_mode: overlay.execution_mode.or(self.execution_mode),
            multi_action_max_successes: overlay
                .multi_action_max_successes
                .or(self.multi_action_max_successes),
            confidence_threshold: overlay.confidence_threshold.or(self.confidence_threshold),
            low_confidence_action: overlay.low_confidence_action.or(self.low_confidence_action),
            observation_max_chars: overlay.observation_max_chars.or(self.observation_max_chars),
        }
    }
}

impl RetrievalSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            top_k: overlay.top_k.or(self.top_k),
            hybrid_weight: overlay.hybrid_weight.or(self.hybrid_weight),
            min_score: overlay.min_score.or(self.min_score),
            corpus_path: overlay.corpus_path.or(self.corpus_path),
            embedding_base_url: overlay.embedding_base_url.or(self.embedding_base_url),
            embedding_model: overlay.embedding_model.or(self.embedding_model),
            embedding_dim: overlay.embedding_dim.or(self.embedding_dim),
            timeout_ms: overlay.timeout_ms.or(self.timeout_ms),
        }
    }
}

impl HistorySettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            window_max_turns: overlay.window_max_turns.or(self.window_max_turns),
            token_budget: overlay.token_budget.or(self.token_budget),
        }
    }
}

impl InferenceSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            url: overlay.url.or(self.url),
            model: overlay.model.or(self.model),
            temperature: overlay.temperature.or(self.temperature),
            max_output_tokens: overlay.max_output_tokens.or(self.max_output_tokens),
            stream: overlay.stream.or(self.stream),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
        }
    }
}

impl BackendSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            url: overlay.url.or(self.url),
            tool_timeout_secs: overlay.tool_timeout_secs.or(self.tool_timeout_secs),
            long_running_tool_timeout_secs: overlay
                .long_running_tool_timeout_secs
                .or(self.long_running_tool_timeout_secs),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn positive_u32(value: Option<u32>, source: &str) -> Option<u32> {
    match value {
        Some(0) => {
            tracing::warn!(source, "setting must be positive; keeping default");
            None
        }
        other => other,
    }
}

fn unit_f32(value: Option<f32>, source: &str) -> Option<f32> {
    let value = value?;
    if (0.0..=1.0).contains(&value) {
        return Some(value);
    }
    tracing::warn!(
        source,
        value,
        "invalid unit value (expected 0.0..=1.0); keeping default"
    );
    None
}

fn warn_invalid(source: &str, raw: &str, expected: &str) {
    tracing::warn!(source, value = raw, expected, "invalid setting; keeping default");
}

/// Settings from `<project root>/packages/conf/settings.yaml`, overlaid by the
/// user file under the config home.
pub fn load_runtime_settings() -> RuntimeSettings {
    let (system_path, user_path) = runtime_settings_paths();
    load_runtime_settings_from_paths(&system_path, &user_path)
}

#[doc(hidden)]
pub fn runtime_settings_paths() -> (PathBuf, PathBuf) {
    let root = env_path("PRJ_ROOT")
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let config_home = CONFIG_HOME_OVERRIDE
        .get()
        .cloned()
        .or_else(|| env_path("PRJ_CONFIG_HOME"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_HOME_RELATIVE_PATH));
    let config_home = if config_home.is_absolute() {
        config_home
    } else {
        root.join(config_home)
    };
    (
        root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH),
        config_home.join(DEFAULT_USER_SETTINGS_RELATIVE_PATH),
    )
}

#[doc(hidden)]
pub fn load_runtime_settings_from_paths(system: &Path, user: &Path) -> RuntimeSettings {
    read_layer(system)
        .unwrap_or_default()
        .merge(read_layer(user).unwrap_or_default())
}

/// `None` when the file is absent or unusable; unusable files are logged.
fn read_layer(path: &Path) -> Option<RuntimeSettings> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "settings file unreadable; skipped");
            return None;
        }
    };
    serde_yaml::from_str(&raw)
        .inspect_err(|error| {
            tracing::warn!(path = %path.display(), error = %error, "settings file is not valid yaml; skipped");
        })
        .ok()
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Pin the config home for this process (CLI `--conf`). Relative paths resolve
/// against the project root. The first value wins.
pub fn set_config_home_override(path: impl Into<PathBuf>) {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return;
    }
    if let Err(rejected) = CONFIG_HOME_OVERRIDE.set(path)
        && CONFIG_HOME_OVERRIDE.get() != Some(&rejected)
    {
        tracing::warn!(ignored = %rejected.display(), "config home already pinned; ignoring");
    }
}
