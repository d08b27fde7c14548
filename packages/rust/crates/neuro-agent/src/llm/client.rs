//! LLM client: OpenAI-compatible chat completions, batched or SSE-streamed.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{InferenceError, InferenceRequest, ReasoningEngine};
use crate::session::ChatMessage;

const ERROR_BODY_MAX_CHARS: usize = 512;

/// Request body for chat completions (OpenAI format).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Response: choices[0].message.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Streaming chunk: choices[0].delta.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for chat completions.
pub struct HttpReasoningEngine {
    client: reqwest::Client,
    inference_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpReasoningEngine {
    pub fn new(inference_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            inference_url,
            model,
            api_key,
        }
    }

    async fn send(&self, request: &InferenceRequest) -> Result<reqwest::Response, InferenceError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
            stream: request.stream,
        };
        let mut req = self
            .client
            .post(&self.inference_url)
            .json(&body)
            .header("Content-Type", "application/json");
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        let res = req
            .send()
            .await
            .map_err(|error| InferenceError::Unreachable(error.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(InferenceError::HttpStatus {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_MAX_CHARS).collect(),
            });
        }
        Ok(res)
    }

    async fn read_batched(res: reqwest::Response) -> Result<String, InferenceError> {
        let text = res
            .text()
            .await
            .map_err(|error| InferenceError::Malformed(error.to_string()))?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|error| InferenceError::Malformed(format!("{error}; body: {text}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(InferenceError::Empty);
        }
        Ok(content)
    }

    async fn read_stream(
        res: reqwest::Response,
        fragments: &mpsc::Sender<String>,
        cancel: &CancellationToken,
    ) -> Result<String, InferenceError> {
        let mut stream = res.bytes_stream();
        // Raw bytes: a UTF-8 sequence may straddle two network chunks.
        let mut buffer: Vec<u8> = Vec::new();
        let mut output = String::new();
        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(InferenceError::Cancelled),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else {
                break;
            };
            let bytes = chunk.map_err(|error| InferenceError::Malformed(error.to_string()))?;
            buffer.extend_from_slice(&bytes);
            while let Some(newline) = buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                match parse_sse_line(&String::from_utf8_lossy(&line))? {
                    SseLine::Done => return finish(output),
                    SseLine::Fragment(text) => {
                        output.push_str(&text);
                        let _ = fragments.send(text).await;
                    }
                    SseLine::Skip => {}
                }
            }
        }
        if let SseLine::Fragment(text) = parse_sse_line(&String::from_utf8_lossy(&buffer))? {
            output.push_str(&text);
            let _ = fragments.send(text).await;
        }
        finish(output)
    }
}

fn finish(output: String) -> Result<String, InferenceError> {
    if output.trim().is_empty() {
        Err(InferenceError::Empty)
    } else {
        Ok(output)
    }
}

enum SseLine {
    Fragment(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> Result<SseLine, InferenceError> {
    let line = line.trim();
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if payload.is_empty() {
        return Ok(SseLine::Skip);
    }
    let chunk: ChatCompletionChunk = serde_json::from_str(payload)
        .map_err(|error| InferenceError::Malformed(format!("{error}; chunk: {payload}")))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty())
        .map_or(SseLine::Skip, SseLine::Fragment))
}

#[async_trait]
impl ReasoningEngine for HttpReasoningEngine {
    async fn generate(
        &self,
        request: InferenceRequest,
        fragments: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<String, InferenceError> {
        let res = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(InferenceError::Cancelled),
            res = self.send(&request) => res?,
        };
        if request.stream {
            Self::read_stream(res, &fragments, &cancel).await
        } else {
            tokio::select! {
                biased;
                () = cancel.cancelled() => Err(InferenceError::Cancelled),
                text = Self::read_batched(res) => text,
            }
        }
    }
}
