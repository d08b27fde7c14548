//! Agent configuration: loop limits, verification policy, retrieval, inference and backend endpoints.

use std::path::PathBuf;
use std::time::Duration;

use neuro_window::WindowLimits;
use serde::{Deserialize, Serialize};

/// Local OpenAI-compatible endpoint (e.g. Ollama or a llama.cpp server).
pub const DEFAULT_INFERENCE_URL: &str = "http://127.0.0.1:11434/v1/chat/completions";
/// Local EEG backend facade.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8765";

/// How many successful tool executions one user message may trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Stop after the first successful tool execution.
    #[default]
    Single,
    /// Continue until `multi_action_max_successes` or the engine stops.
    Multi,
}

impl ExecutionMode {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }

    /// Parse `single` / `multi` (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "multi" => Some(Self::Multi),
            _ => None,
        }
    }
}

/// What to do with a structurally valid call whose confidence is below threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowConfidenceAction {
    /// Park the call and ask the user.
    #[default]
    Confirm,
    /// Feed a self-correction observation back to the engine.
    SelfCorrect,
}

impl LowConfidenceAction {
    /// Parse `confirm` / `self_correct` (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "confirm" => Some(Self::Confirm),
            "self_correct" => Some(Self::SelfCorrect),
            _ => None,
        }
    }
}

/// Example retrieval config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Examples injected per prompt.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Keyword weight for hybrid scoring; `None` = vector only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid_weight: Option<f32>,
    /// Examples scoring below this are dropped.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    /// JSON corpus of reference examples; retrieval is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,
    /// Optional embedding service base URL (`/embed/batch`); local hashing otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_base_url: Option<String>,
    /// Optional embedding model id sent to the embedding service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    /// Dimension of the local hashing encoder.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    /// Upper bound on one retrieval (embedding + search).
    #[serde(default = "default_retrieval_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_top_k() -> usize {
    3
}
fn default_min_score() -> f32 {
    0.1
}
fn default_embedding_dim() -> usize {
    384
}
fn default_retrieval_timeout_ms() -> u64 {
    5_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            hybrid_weight: None,
            min_score: default_min_score(),
            corpus_path: None,
            embedding_base_url: None,
            embedding_model: None,
            embedding_dim: default_embedding_dim(),
            timeout_ms: default_retrieval_timeout_ms(),
        }
    }
}

impl RetrievalConfig {
    /// Retrieval timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

/// Configuration for one orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Chat completions endpoint (OpenAI-compatible).
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    /// Model id sent with each request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Explicit API key; see [`AgentConfig::resolve_api_key`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum generated tokens per inference.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Request SSE streaming and forward fragments to the consumer.
    #[serde(default = "default_stream")]
    pub stream: bool,
    /// Deadline for a single inference.
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,

    /// Backend facade base URL.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Timeout for ordinary tool calls.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// Timeout for tools flagged `long_running` (training).
    #[serde(default = "default_long_running_tool_timeout_secs")]
    pub long_running_tool_timeout_secs: u64,

    /// Hard ceiling on loop iterations per user message.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Consecutive failures (rejections, soft engine errors, failed executions) before stopping.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Identical failing executions in a row before the loop is broken. Each of
    /// them also advances the failure cap, so a value above
    /// `max_consecutive_failures` never fires.
    #[serde(default = "default_loop_break_threshold")]
    pub loop_break_threshold: u32,
    /// Single vs multi action per user message.
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    /// Success cap in multi mode.
    #[serde(default = "default_multi_action_max_successes")]
    pub multi_action_max_successes: u32,
    /// Calls below this confidence are not auto-accepted.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Confirm vs self-correct for low-confidence calls.
    #[serde(default)]
    pub low_confidence_action: LowConfidenceAction,

    /// Maximum retained history turns.
    #[serde(default = "default_window_max_turns")]
    pub window_max_turns: usize,
    /// Optional token budget for retained history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_token_budget: Option<usize>,
    /// Observation summaries are truncated to this many characters.
    #[serde(default = "default_observation_max_chars")]
    pub observation_max_chars: usize,

    /// Example retrieval.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

fn default_inference_url() -> String {
    DEFAULT_INFERENCE_URL.to_string()
}
fn default_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_output_tokens() -> u32 {
    512
}
fn default_stream() -> bool {
    true
}
fn default_inference_timeout_secs() -> u64 {
    45
}
fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_long_running_tool_timeout_secs() -> u64 {
    3_600
}
fn default_max_iterations() -> u32 {
    10
}
fn default_max_consecutive_failures() -> u32 {
    3
}
fn default_loop_break_threshold() -> u32 {
    3
}
fn default_multi_action_max_successes() -> u32 {
    5
}
fn default_confidence_threshold() -> f32 {
    0.55
}
fn default_window_max_turns() -> usize {
    40
}
fn default_observation_max_chars() -> usize {
    600
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            inference_url: default_inference_url(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            stream: default_stream(),
            inference_timeout_secs: default_inference_timeout_secs(),
            backend_url: default_backend_url(),
            tool_timeout_secs: default_tool_timeout_secs(),
            long_running_tool_timeout_secs: default_long_running_tool_timeout_secs(),
            max_iterations: default_max_iterations(),
            max_consecutive_failures: default_max_consecutive_failures(),
            loop_break_threshold: default_loop_break_threshold(),
            execution_mode: ExecutionMode::default(),
            multi_action_max_successes: default_multi_action_max_successes(),
            confidence_threshold: default_confidence_threshold(),
            low_confidence_action: LowConfidenceAction::default(),
            window_max_turns: default_window_max_turns(),
            history_token_budget: None,
            observation_max_chars: default_observation_max_chars(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Resolve API key: config value, then `OPENAI_API_KEY`.
    /// Local endpoints (127.0.0.1 / localhost) get no key.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }
        if self.inference_url.contains("127.0.0.1") || self.inference_url.contains("localhost") {
            return None;
        }
        std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Successful executions allowed per user message.
    #[must_use]
    pub fn success_cap(&self) -> u32 {
        match self.execution_mode {
            ExecutionMode::Single => 1,
            ExecutionMode::Multi => self.multi_action_max_successes.max(1),
        }
    }

    /// Whether the loop-break guard can trip before the failure cap does.
    #[must_use]
    pub fn loop_break_reachable(&self) -> bool {
        self.loop_break_threshold <= self.max_consecutive_failures
    }

    /// History window ceilings.
    #[must_use]
    pub fn window_limits(&self) -> WindowLimits {
        WindowLimits {
            max_turns: self.window_max_turns.max(1),
            max_tokens: self.history_token_budget,
        }
    }

    /// Inference deadline.
    #[must_use]
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs.max(1))
    }

    /// Dispatch timeout for a tool.
    #[must_use]
    pub fn tool_timeout(&self, long_running: bool) -> Duration {
        if long_running {
            Duration::from_secs(self.long_running_tool_timeout_secs.max(1))
        } else {
            Duration::from_secs(self.tool_timeout_secs.max(1))
        }
    }
}
