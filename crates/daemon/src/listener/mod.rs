// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task: accepts Unix-socket connections and dispatches each
//! [`Request`](crate::protocol::Request) against the shared [`DaemonState`],
//! independent of the engine's own event-loop concerns.

mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};
use weave_engine::hub::{HandlerResult, HubMessage};
use weave_engine::{InputHandler, OutputHandler};

use crate::config::Config;
use crate::lifecycle::DaemonState;
use crate::protocol::{self, Request, Response};

/// Context shared by every connection handler.
pub struct ListenCtx {
    pub daemon: tokio::sync::Mutex<DaemonState>,
    pub config: Config,
    pub shutdown: Arc<Notify>,
}

/// Registered-module handler for modules whose actual work happens outside
/// this process. The hub's mailbox already records request/result/error for
/// callers; this handler's only job is to acknowledge so `send` completes.
struct RemoteModuleHandler;

#[async_trait]
impl InputHandler for RemoteModuleHandler {
    async fn handle(&self, message: &HubMessage) -> HandlerResult {
        Ok(message.payload.clone())
    }
}

#[async_trait]
impl OutputHandler for RemoteModuleHandler {
    async fn handle(
        &self,
        message: &HubMessage,
        _completion: Option<tokio::sync::oneshot::Sender<HandlerResult>>,
    ) -> HandlerResult {
        Ok(message.payload.clone())
    }
}

pub struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, ctx }
    }

    pub async fn run(self) {
        loop {
            tokio::select! {
                accepted = self.unix.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!(error = %e, "accept error"),
                    }
                }
                _ = self.ctx.shutdown.notified() => {
                    info!("listener stopping");
                    return;
                }
            }
        }
    }
}

fn log_connection_error(e: protocol::ProtocolError) {
    match e {
        protocol::ProtocolError::ConnectionClosed => debug!("client disconnected"),
        protocol::ProtocolError::Timeout => warn!("connection timed out"),
        other => error!(error = %other, "connection error"),
    }
}

async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), protocol::ProtocolError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let request = protocol::read_request(&mut reader, ctx.config.ipc_timeout).await?;
    info!(request = ?request, "received request");

    let response = handlers::handle_request(request, ctx).await;

    debug!(response = ?response, "sending response");
    protocol::write_response(&mut writer, &response, ctx.config.ipc_timeout).await
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
