//! Built-in EEG tool set: definitions plus typed handlers forwarding to the backend.

use std::sync::Arc;

use neuro_types::{ParamKind, ToolDefinition, ToolParameter};
use serde::{Deserialize, Serialize};

use super::registry::{HandlerRegistry, TypedHandler};
use crate::backend::BackendFacade;

/// `load_data` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadDataParams {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// `apply_filter` parameters (Hz).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyFilterParams {
    pub low: f64,
    pub high: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<f64>,
}

/// `apply_notch` parameters (Hz).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyNotchParams {
    pub freq: f64,
}

/// `resample` parameters (Hz).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResampleParams {
    pub target_rate: u32,
}

/// `set_model` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetModelParams {
    pub model_type: String,
}

/// `configure_training` parameters; omitted fields keep the backend's current value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigureTrainingParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_split: Option<f64>,
}

/// `visualize` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisualizeParams {
    pub kind: String,
}

/// Tools without parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

const MODEL_TYPES: &[&str] = &["eegnet", "shallow_convnet", "deep_convnet", "lstm"];
const PLOT_KINDS: &[&str] = &["raw", "psd", "topomap", "training_curves", "confusion_matrix"];
const FILE_FORMATS: &[&str] = &["edf", "bdf", "fif", "set", "csv"];

/// Definitions of the EEG workflow tools.
#[must_use]
pub fn eeg_catalog() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("load_data", "Load an EEG recording from disk.", "data")
            .param(ToolParameter::required(
                "path",
                ParamKind::String,
                "Path to the recording file.",
            ))
            .param(
                ToolParameter::optional("format", ParamKind::String, "File format; inferred from the extension when omitted.")
                    .with_allowed(FILE_FORMATS),
            )
            .stages(&["empty", "data_loaded"]),
        ToolDefinition::new(
            "apply_filter",
            "Band-pass filter the loaded signal between `low` and `high` Hz.",
            "preprocessing",
        )
        .param(
            ToolParameter::required("low", ParamKind::Number, "Lower cutoff in Hz.")
                .with_range(0.0, 1000.0),
        )
        .param(
            ToolParameter::required("high", ParamKind::Number, "Upper cutoff in Hz.")
                .with_range(0.0, 1000.0),
        )
        .param(
            ToolParameter::optional("notch", ParamKind::Number, "Optional notch frequency in Hz.")
                .with_range(1.0, 500.0),
        )
        .param(
            ToolParameter::optional(
                "sampling_rate",
                ParamKind::Number,
                "Sampling rate in Hz; bounds `high` below Nyquist.",
            )
            .with_minimum(1.0),
        )
        .stages(&["data_loaded", "preprocessed"]),
        ToolDefinition::new("apply_notch", "Remove line noise at `freq` Hz.", "preprocessing")
            .param(
                ToolParameter::required("freq", ParamKind::Number, "Notch frequency in Hz.")
                    .with_range(1.0, 500.0),
            )
            .stages(&["data_loaded", "preprocessed"]),
        ToolDefinition::new("resample", "Resample the signal to `target_rate` Hz.", "preprocessing")
            .param(
                ToolParameter::required("target_rate", ParamKind::Integer, "New sampling rate in Hz.")
                    .with_minimum(1.0),
            )
            .stages(&["data_loaded", "preprocessed"]),
        ToolDefinition::new("set_model", "Choose the classifier architecture.", "model")
            .param(
                ToolParameter::required("model_type", ParamKind::String, "Architecture name.")
                    .with_allowed(MODEL_TYPES),
            )
            .stages(&["preprocessed", "model_set"]),
        ToolDefinition::new(
            "configure_training",
            "Set training hyperparameters; omitted values are kept.",
            "training",
        )
        .param(ToolParameter::optional("epochs", ParamKind::Integer, "Training epochs.").with_minimum(1.0))
        .param(ToolParameter::optional("batch_size", ParamKind::Integer, "Mini-batch size.").with_minimum(1.0))
        .param(
            ToolParameter::optional("learning_rate", ParamKind::Number, "Optimizer learning rate.")
                .with_range(0.0, 1.0),
        )
        .param(
            ToolParameter::optional(
                "validation_split",
                ParamKind::Number,
                "Fraction of data held out for validation.",
            )
            .with_range(0.0, 1.0),
        )
        .stages(&["model_set", "training_configured"]),
        ToolDefinition::new("run_training", "Train the configured model. May take minutes.", "training")
            .long_running()
            .stages(&["training_configured", "trained"]),
        ToolDefinition::new("visualize", "Render a plot of the current data or results.", "visualization")
            .param(
                ToolParameter::required("kind", ParamKind::String, "Plot kind.")
                    .with_allowed(PLOT_KINDS),
            )
            .stages(&["data_loaded", "preprocessed", "trained"]),
        ToolDefinition::new("get_status", "Report the current pipeline status.", "info"),
        ToolDefinition::new(
            "clear_dataset",
            "Discard the loaded recording and every derived result.",
            "data",
        )
        .destructive()
        .stages(&["data_loaded", "preprocessed", "model_set", "training_configured", "trained"]),
        ToolDefinition::new("reset_model", "Discard the model and its trained weights.", "model")
            .destructive()
            .stages(&["model_set", "training_configured", "trained"]),
    ]
}

/// Typed handlers for every tool in [`eeg_catalog`], bound to `backend`.
pub fn eeg_handlers(backend: &Arc<dyn BackendFacade>) -> HandlerRegistry {
    let b = || Arc::clone(backend);
    HandlerRegistry::new()
        .with("load_data", Arc::new(TypedHandler::<LoadDataParams>::new("load_data", b())))
        .with("apply_filter", Arc::new(TypedHandler::<ApplyFilterParams>::new("apply_filter", b())))
        .with("apply_notch", Arc::new(TypedHandler::<ApplyNotchParams>::new("apply_notch", b())))
        .with("resample", Arc::new(TypedHandler::<ResampleParams>::new("resample", b())))
        .with("set_model", Arc::new(TypedHandler::<SetModelParams>::new("set_model", b())))
        .with(
            "configure_training",
            Arc::new(TypedHandler::<ConfigureTrainingParams>::new("configure_training", b())),
        )
        .with("run_training", Arc::new(TypedHandler::<NoParams>::new("run_training", b())))
        .with("visualize", Arc::new(TypedHandler::<VisualizeParams>::new("visualize", b())))
        .with("get_status", Arc::new(TypedHandler::<NoParams>::new("get_status", b())))
        .with("clear_dataset", Arc::new(TypedHandler::<NoParams>::new("clear_dataset", b())))
        .with("reset_model", Arc::new(TypedHandler::<NoParams>::new("reset_model", b())))
}
