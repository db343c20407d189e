// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tokio::net::UnixStream;
use weave_core::WorkflowId;

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        socket_path: dir.join("daemon.sock"),
        lock_path: dir.join("daemon.pid"),
        log_path: dir.join("daemon.log"),
        ipc_timeout: Duration::from_millis(500),
        drain_timeout: Duration::from_millis(500),
        health_check_interval_ms: 10_000,
        log_level: "info".to_string(),
        desktop_notifications: false,
        state_dir: dir.to_path_buf(),
    }
}

async fn spawn_listener(dir: &std::path::Path) -> (Arc<ListenCtx>, tokio::task::JoinHandle<()>) {
    let config = test_config(dir);
    let result = crate::lifecycle::startup(&config).await.expect("startup");
    let shutdown = Arc::new(tokio::sync::Notify::new());
    let ctx = Arc::new(ListenCtx {
        daemon: tokio::sync::Mutex::new(result.daemon),
        config,
        shutdown: Arc::clone(&shutdown),
    });
    let listener = Listener::new(result.listener, Arc::clone(&ctx));
    let handle = tokio::spawn(listener.run());
    (ctx, handle)
}

async fn roundtrip(ctx: &ListenCtx, request: Request) -> Response {
    let mut stream = UnixStream::connect(&ctx.config.socket_path).await.expect("connect");
    protocol::write_frame(&mut stream, &request, ctx.config.ipc_timeout).await.expect("write request");
    protocol::read_frame(&mut stream, ctx.config.ipc_timeout).await.expect("read response")
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ctx, handle) = spawn_listener(dir.path()).await;

    let response = roundtrip(&ctx, Request::Ping).await;

    assert!(matches!(response, Response::Pong));
    ctx.shutdown.notify_waiters();
    let _ = handle.await;
}

#[tokio::test]
async fn hello_reports_the_protocol_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ctx, handle) = spawn_listener(dir.path()).await;

    let response = roundtrip(&ctx, Request::Hello).await;

    assert!(matches!(response, Response::Hello { .. }));
    ctx.shutdown.notify_waiters();
    let _ = handle.await;
}

#[tokio::test]
async fn pausing_an_unknown_workflow_returns_an_error_response() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ctx, handle) = spawn_listener(dir.path()).await;

    let request = Request::WorkflowPause { workflow_id: WorkflowId::new() };
    let response = roundtrip(&ctx, request).await;

    assert!(matches!(response, Response::Error { .. }));
    ctx.shutdown.notify_waiters();
    let _ = handle.await;
}

#[tokio::test]
async fn shutdown_request_notifies_the_listener_to_stop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ctx, handle) = spawn_listener(dir.path()).await;

    let response = roundtrip(&ctx, Request::Shutdown).await;
    assert!(matches!(response, Response::ShuttingDown));

    tokio::time::timeout(Duration::from_secs(1), handle).await.expect("listener stopped in time").expect("no panic");
}

#[tokio::test]
async fn two_connections_in_a_row_are_each_served() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (ctx, handle) = spawn_listener(dir.path()).await;

    let first = roundtrip(&ctx, Request::Ping).await;
    let second = roundtrip(&ctx, Request::Hello).await;

    assert!(matches!(first, Response::Pong));
    assert!(matches!(second, Response::Hello { .. }));

    ctx.shutdown.notify_waiters();
    let _ = handle.await;
}
