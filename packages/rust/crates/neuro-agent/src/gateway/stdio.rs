//! Stdio gateway: one instruction per input line, every event as one JSON line.
//!
//! `/cancel` takes effect immediately; other lines typed while a turn runs are
//! queued and submitted in order once it ends. `/confirm`, `/decline` and
//! `/metrics` are control lines.

use std::collections::VecDeque;

use anyhow::Result;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::controller::AgentEvent;
use crate::handle::SessionHandle;

/// Cancels the running turn.
pub const STDIO_CANCEL_COMMAND: &str = "/cancel";
const CONFIRM_COMMAND: &str = "/confirm";
const DECLINE_COMMAND: &str = "/decline";
const METRICS_COMMAND: &str = "/metrics";

/// Run until `reader` reaches EOF and the last queued turn has finished.
pub async fn run_stdio<R, W>(handle: SessionHandle, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut queued: VecDeque<String> = VecDeque::new();
    let mut active: Option<UnboundedReceiver<AgentEvent>> = None;
    let mut input_open = true;

    loop {
        if active.is_none() {
            if let Some(line) = queued.pop_front() {
                active = start(&handle, &line, &mut writer).await?;
                continue;
            }
            if !input_open {
                break;
            }
        }
        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                None => input_open = false,
                Some(line) => {
                    let line = line.trim();
                    if line == STDIO_CANCEL_COMMAND {
                        handle.cancel();
                    } else if !line.is_empty() {
                        queued.push_back(line.to_string());
                    }
                }
            },
            event = next_event(&mut active), if active.is_some() => match event {
                Some(event) => write_json_line(&mut writer, &event).await?,
                None => active = None,
            },
        }
    }
    Ok(())
}

async fn start<W: AsyncWrite + Unpin>(
    handle: &SessionHandle,
    line: &str,
    writer: &mut W,
) -> Result<Option<UnboundedReceiver<AgentEvent>>> {
    let receiver = match line {
        CONFIRM_COMMAND => handle.confirm().await?,
        DECLINE_COMMAND => handle.decline().await?,
        METRICS_COMMAND => {
            write_json_line(writer, &handle.metrics()).await?;
            return Ok(None);
        }
        text => handle.submit(text).await?,
    };
    Ok(Some(receiver))
}

async fn next_event(active: &mut Option<UnboundedReceiver<AgentEvent>>) -> Option<AgentEvent> {
    match active {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn write_json_line<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
