//! HTTP backend facade: `GET /stage`, `POST /ops/{name}`.

use std::time::Duration;

use async_trait::async_trait;
use neuro_types::{BackendResult, StageSnapshot};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::{BackendError, BackendFacade};

const ERROR_BODY_MAX_CHARS: usize = 512;

/// Backend facade over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Client with a per-request timeout (use the long-running tool timeout).
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn map_transport(&self, error: &reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Transport(error.to_string())
        }
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_MAX_CHARS).collect()
}

#[async_trait]
impl BackendFacade for HttpBackend {
    async fn stage(&self) -> Result<StageSnapshot, BackendError> {
        let url = format!("{}/stage", self.base_url);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| self.map_transport(&error))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|error| self.map_transport(&error))?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        serde_json::from_str(&body).map_err(|error| BackendError::Decode(error.to_string()))
    }

    async fn call(&self, operation: &str, parameters: Value) -> Result<BackendResult, BackendError> {
        let url = format!("{}/ops/{operation}", self.base_url);
        let res = self
            .client
            .post(&url)
            .json(&parameters)
            .send()
            .await
            .map_err(|error| self.map_transport(&error))?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::UnknownOperation(operation.to_string()));
        }
        let body = res
            .text()
            .await
            .map_err(|error| self.map_transport(&error))?;
        // Operation failures may arrive as 4xx/5xx with a `{success, data, error}` body.
        match serde_json::from_str::<BackendResult>(&body) {
            Ok(result) => Ok(result),
            Err(_) if !status.is_success() => Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            }),
            Err(error) => Err(BackendError::Decode(error.to_string())),
        }
    }
}
