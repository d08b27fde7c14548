//! Reasoning engine seam: request shape, error taxonomy, HTTP client and inference worker.

mod client;
mod worker;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::session::ChatMessage;

pub use client::HttpReasoningEngine;
pub use worker::{InferenceJob, InferenceWorker};

/// One inference: role-tagged messages plus sampling config.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    /// Ordered messages (system first).
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum generated tokens.
    pub max_output_tokens: u32,
    /// Whether to stream fragments.
    pub stream: bool,
}

/// Inference failures. Soft errors are retried inside the loop; the rest end the turn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Endpoint could not be reached.
    #[error("reasoning engine unreachable: {0}")]
    Unreachable(String),
    /// Endpoint answered with a non-success status.
    #[error("reasoning engine returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },
    /// Response could not be decoded.
    #[error("malformed reasoning engine response: {0}")]
    Malformed(String),
    /// No text was produced.
    #[error("reasoning engine returned an empty response")]
    Empty,
    /// Deadline elapsed.
    #[error("inference timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// Generation was cancelled by the consumer.
    #[error("inference cancelled")]
    Cancelled,
}

impl InferenceError {
    /// Soft errors are retried within the loop and count toward the failure cap.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Empty | Self::Timeout(_))
    }
}

/// Anything that turns messages into text, batched or as fragments.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Produce the full response. Streaming engines also send each fragment on `fragments`
    /// as it arrives. Must return [`InferenceError::Cancelled`] promptly once `cancel` fires.
    async fn generate(
        &self,
        request: InferenceRequest,
        fragments: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<String, InferenceError>;
}
