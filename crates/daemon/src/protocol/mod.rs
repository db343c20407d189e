// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication (§6 "External interfaces").
//!
//! Wire format: a 4-byte big-endian length prefix followed by a JSON payload,
//! independent of whether the concrete transport ends up being a Unix domain
//! socket, a TCP socket, or an in-process channel in tests.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use weave_core::{AgentInstanceId, AgentInstanceState, ErrorEnvelope, ModuleKind, SessionId, WorkflowId};

/// Largest frame this daemon will read before giving up — guards against a
/// misbehaving client claiming an absurd length prefix.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,
    #[error("request timed out")]
    Timeout,
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    FrameTooLarge(u32),
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A registered module descriptor, as supplied by `registerModule` (§4.1/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub kind: ModuleKind,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// What `agent.control` asks the Agent Pool to do to a running instance (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentControlAction {
    Status,
    Pause,
    Resume,
    Interrupt,
    Cancel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Liveness probe; always answered with `Response::Pong`.
    Ping,
    /// Version handshake.
    Hello,
    /// `sendMessage(target, message, opts)` (§4.1, §6).
    SendMessage {
        target: String,
        message_type: String,
        payload: serde_json::Value,
        #[serde(default)]
        blocking: bool,
        #[serde(default)]
        callback_id: Option<String>,
    },
    /// `registerModule` (§4.1, §6).
    RegisterModule { descriptor: ModuleDescriptor },
    WorkflowPause { workflow_id: WorkflowId },
    WorkflowResume { workflow_id: WorkflowId },
    WorkflowCancel { workflow_id: WorkflowId },
    /// `workflow.input` (§4.2 wait_user_decision, §4.3 instruction bus).
    WorkflowInput { workflow_id: WorkflowId, input: String },
    /// `agent.dispatch` (§4.4 "Session binding & dispatch").
    AgentDispatch {
        source_session: SessionId,
        target: AgentInstanceId,
        #[serde(default)]
        queue_on_busy: bool,
        #[serde(default)]
        max_queue_wait_ms: Option<u64>,
    },
    /// `agent.control` (§6).
    AgentControl { action: AgentControlAction, target: AgentInstanceId },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Hello { version: String },
    Ok,
    SendMessageResult { message_id: String, result: Option<serde_json::Value> },
    Registered { id: String },
    DispatchResult { session_id: SessionId, queued: bool },
    /// `agent.control { action: status }` (§6).
    AgentStatus { state: AgentInstanceState },
    /// `workflow.input` (§4.3): `ask_id` is set when the input resolved a
    /// pending ask directly rather than being queued as a runtime instruction.
    InputDelivered { ask_id: Option<String> },
    ShuttingDown,
    Error { error: ErrorEnvelope },
}

impl Response {
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Response::Error {
            error: ErrorEnvelope { kind: kind.to_string(), message: message.into(), details: None },
        }
    }
}

/// Read one length-prefixed frame and deserialize it as `T`, or
/// `ProtocolError::ConnectionClosed` on a clean EOF before any bytes arrive.
pub async fn read_frame<R: AsyncRead + Unpin, T: for<'de> Deserialize<'de>>(
    reader: &mut R,
    timeout: Duration,
) -> Result<T, ProtocolError> {
    let len = match tokio::time::timeout(timeout, reader.read_u32()).await {
        Ok(Ok(len)) => len,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Ok(Err(e)) => return Err(ProtocolError::Io(e)),
        Err(_) => return Err(ProtocolError::Timeout),
    };
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut buf = vec![0u8; len as usize];
    tokio::time::timeout(timeout, reader.read_exact(&mut buf))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    Ok(serde_json::from_slice(&buf)?)
}

/// Serialize `value` and write it as one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    value: &T,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let bytes = serde_json::to_vec(value)?;
    let len = u32::try_from(bytes.len()).map_err(|_| ProtocolError::FrameTooLarge(u32::MAX))?;
    tokio::time::timeout(timeout, async {
        writer.write_u32(len).await?;
        writer.write_all(&bytes).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}

pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    read_frame(reader, timeout).await
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    write_frame(writer, response, timeout).await
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
