use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use neuro_types::{BackendResult, StageSnapshot};
use serde_json::{Value, json};

use crate::backend::{BackendError, BackendFacade};

const KNOWN_OPERATIONS: &[&str] = &[
    "load_data",
    "apply_filter",
    "apply_notch",
    "resample",
    "set_model",
    "configure_training",
    "run_training",
    "visualize",
    "get_status",
    "clear_dataset",
    "reset_model",
];

/// Tools the simulated backend permits per stage.
fn permitted_at(stage: &str) -> &'static [&'static str] {
    match stage {
        "empty" => &["load_data", "get_status"],
        "data_loaded" => &[
            "load_data",
            "apply_filter",
            "apply_notch",
            "resample",
            "visualize",
            "get_status",
            "clear_dataset",
        ],
        "preprocessed" => &[
            "apply_filter",
            "apply_notch",
            "resample",
            "set_model",
            "visualize",
            "get_status",
            "clear_dataset",
        ],
        "model_set" => &[
            "set_model",
            "configure_training",
            "get_status",
            "clear_dataset",
            "reset_model",
        ],
        "training_configured" => &[
            "set_model",
            "configure_training",
            "run_training",
            "get_status",
            "clear_dataset",
            "reset_model",
        ],
        "trained" => &[
            "configure_training",
            "run_training",
            "visualize",
            "get_status",
            "clear_dataset",
            "reset_model",
        ],
        _ => &[],
    }
}

fn next_stage(operation: &str, current: &str) -> String {
    match operation {
        "load_data" => "data_loaded",
        "apply_filter" | "apply_notch" | "resample" => "preprocessed",
        "set_model" => "model_set",
        "configure_training" => "training_configured",
        "run_training" => "trained",
        "clear_dataset" => "empty",
        "reset_model" => "preprocessed",
        _ => current,
    }
    .to_string()
}

#[derive(Debug, Default)]
struct SimState {
    stage: String,
    permitted_override: Option<BTreeSet<String>>,
    calls: Vec<(String, Value)>,
    failing: BTreeMap<String, String>,
    stage_unavailable: bool,
}

/// In-memory EEG backend: owns the stage → permitted-tools mapping and moves
/// through `empty → data_loaded → preprocessed → model_set → training_configured → trained`.
#[derive(Debug)]
pub struct EegBackendSim {
    state: Mutex<SimState>,
}

impl Default for EegBackendSim {
    fn default() -> Self {
        Self::at_stage("empty")
    }
}

impl EegBackendSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_stage(stage: &str) -> Self {
        Self {
            state: Mutex::new(SimState {
                stage: stage.to_string(),
                ..SimState::default()
            }),
        }
    }

    /// Report exactly `tools` as permitted, whatever the stage.
    #[must_use]
    pub fn permitting(self, tools: &[&str]) -> Self {
        self.state().permitted_override = Some(tools.iter().map(ToString::to_string).collect());
        self
    }

    /// Make `operation` return `{success: false, error}`.
    pub fn fail_operation(&self, operation: &str, error: &str) {
        self.state()
            .failing
            .insert(operation.to_string(), error.to_string());
    }

    /// Make stage queries fail with a transport error.
    pub fn set_stage_unavailable(&self, unavailable: bool) {
        self.state().stage_unavailable = unavailable;
    }

    pub fn stage_name(&self) -> String {
        self.state().stage.clone()
    }

    /// Every operation call, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state().calls.clone()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|(name, _)| name == operation)
            .count()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SimState {
    fn permitted(&self) -> BTreeSet<String> {
        self.permitted_override.clone().unwrap_or_else(|| {
            permitted_at(&self.stage)
                .iter()
                .map(ToString::to_string)
                .collect()
        })
    }
}

#[async_trait]
impl BackendFacade for EegBackendSim {
    async fn stage(&self) -> Result<StageSnapshot, BackendError> {
        let state = self.state();
        if state.stage_unavailable {
            return Err(BackendError::Transport("connection refused".to_string()));
        }
        Ok(StageSnapshot {
            stage: state.stage.clone(),
            permitted_tools: state.permitted(),
        })
    }

    async fn call(&self, operation: &str, parameters: Value) -> Result<BackendResult, BackendError> {
        let mut state = self.state();
        state.calls.push((operation.to_string(), parameters.clone()));
        if !KNOWN_OPERATIONS.contains(&operation) {
            return Err(BackendError::UnknownOperation(operation.to_string()));
        }
        if let Some(error) = state.failing.get(operation) {
            return Ok(BackendResult::failure(error.clone()));
        }
        if !state.permitted().contains(operation) {
            return Ok(BackendResult::failure(format!(
                "`{operation}` is not available at stage `{}`",
                state.stage
            )));
        }
        let stage = next_stage(operation, &state.stage);
        state.stage = stage.clone();
        Ok(BackendResult::ok(json!({
            "operation": operation,
            "stage": stage,
            "parameters": parameters,
        })))
    }
}
