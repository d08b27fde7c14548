//! Backend facade: the stateful EEG service every tool call ends up in.
//!
//! The facade is the single source of truth for tool visibility: its stage
//! query returns the permitted tool names; nothing in the core maps stages to
//! tools on its own.

mod http;

use std::time::Duration;

use async_trait::async_trait;
use neuro_types::{BackendResult, StageSnapshot};
use serde_json::Value;
use thiserror::Error;

pub use http::HttpBackend;

/// Transport-level backend failures. Operation-level failures are `BackendResult { success: false }`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Connection or request failure.
    #[error("backend transport error: {0}")]
    Transport(String),
    /// Non-success status without a decodable result body.
    #[error("backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },
    /// Body could not be decoded.
    #[error("backend response decode error: {0}")]
    Decode(String),
    /// Request exceeded the client timeout.
    #[error("backend request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The backend does not know the operation.
    #[error("unknown backend operation `{0}`")]
    UnknownOperation(String),
}

/// Narrow interface to the backend service.
#[async_trait]
pub trait BackendFacade: Send + Sync {
    /// Current stage and the tool names it permits.
    async fn stage(&self) -> Result<StageSnapshot, BackendError>;

    /// Run one named operation.
    async fn call(&self, operation: &str, parameters: Value) -> Result<BackendResult, BackendError>;
}
