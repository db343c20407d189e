// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health checking for running agent instances (§4.4 "Health check").
//!
//! The default checker performs a raw HTTP `GET /health` over a plain TCP
//! socket — no `reqwest` dependency, matching the rest of this crate's
//! hand-rolled wire-protocol style for talking to sidecar processes.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HealthCheckError {
    #[error("health check timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("connection to port {port} failed: {message}")]
    ConnectFailed { port: u16, message: String },
    #[error("health endpoint returned non-2xx status: {status}")]
    BadStatus { status: String },
}

/// Injectable health checker (§4.4: "call the injected `HealthChecker.check`").
#[async_trait]
pub trait HealthChecker: Send + Sync + 'static {
    async fn check(&self, port: u16, timeout: Duration) -> Result<(), HealthCheckError>;
}

/// Default checker: `GET /health` on `127.0.0.1:port`, 2xx is healthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpHealthChecker;

#[async_trait]
impl HealthChecker for HttpHealthChecker {
    async fn check(&self, port: u16, timeout: Duration) -> Result<(), HealthCheckError> {
        tokio::time::timeout(timeout, self.probe(port))
            .await
            .map_err(|_| HealthCheckError::Timeout { timeout_ms: timeout.as_millis() as u64 })?
    }
}

impl HttpHealthChecker {
    async fn probe(&self, port: u16) -> Result<(), HealthCheckError> {
        let mut stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .map_err(|e| HealthCheckError::ConnectFailed { port, message: e.to_string() })?;

        let request = "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|e| HealthCheckError::ConnectFailed { port, message: e.to_string() })?;

        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .await
            .map_err(|e| HealthCheckError::ConnectFailed { port, message: e.to_string() })?;

        let response = String::from_utf8_lossy(&buf);
        let status_line = response.lines().next().unwrap_or("");
        if status_line.contains(" 2") {
            Ok(())
        } else {
            Err(HealthCheckError::BadStatus { status: status_line.to_string() })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Scripted health checker: returns whatever was configured per port,
    /// defaulting to healthy.
    #[derive(Clone, Default)]
    pub struct FakeHealthChecker {
        results: Arc<Mutex<HashMap<u16, Result<(), HealthCheckError>>>>,
    }

    impl FakeHealthChecker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_result(&self, port: u16, result: Result<(), HealthCheckError>) {
            self.results.lock().insert(port, result);
        }
    }

    #[async_trait]
    impl HealthChecker for FakeHealthChecker {
        async fn check(&self, port: u16, _timeout: Duration) -> Result<(), HealthCheckError> {
            self.results.lock().get(&port).cloned().unwrap_or(Ok(()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHealthChecker;

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
