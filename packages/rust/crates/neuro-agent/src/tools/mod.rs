//! Tool catalog, handler registry and the built-in EEG tool set.

mod builtin;
mod catalog;
mod registry;

pub use builtin::{
    ApplyFilterParams, ApplyNotchParams, ConfigureTrainingParams, LoadDataParams, NoParams,
    ResampleParams, SetModelParams, VisualizeParams, eeg_catalog, eeg_handlers,
};
pub use catalog::{ToolCatalog, VisibleTools};
pub use registry::{
    HandlerRegistry, RegistryError, ToolError, ToolHandler, TypedHandler, decode_params,
};
