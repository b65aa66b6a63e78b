//! IPC Server for the eye-rest timer.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Integration with TimerEngine and the alert channels

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::alert::AlertDispatcher;
use crate::speech::sanitize_utterance;
use crate::types::{IpcRequest, IpcResponse, TimerSnapshot};

use super::timer::TimerEngine;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// Client closed the connection without sending anything
    #[error("Connection closed by client")]
    EmptyRequest,
}

impl IpcError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::ReadError(_) | Self::EmptyRequest => "Retry the command",
            Self::Timeout => "Check that the daemon is not stuck; restart it with `eyerest daemon`",
            Self::RequestTooLarge => "Shorten the text passed to `eyerest say`",
        }
    }
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Reads one request, up to the client closing its write side.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(256);
        let limit = (MAX_REQUEST_SIZE + 1) as u64;

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            (&mut *stream).take(limit).read_to_end(&mut buffer),
        )
        .await;

        match read_result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        }

        if buffer.is_empty() {
            return Err(IpcError::EmptyRequest.into());
        }
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest =
            serde_json::from_slice(&buffer).context("Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;
        stream
            .shutdown()
            .await
            .context("Failed to shut down response stream")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the engine and alert channels.
#[derive(Clone)]
pub struct RequestHandler {
    /// Shared reference to the timer engine
    engine: Arc<Mutex<TimerEngine>>,
    /// Alert channels, used for authorization and ad-hoc speech
    alerts: AlertDispatcher,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(engine: Arc<Mutex<TimerEngine>>, alerts: AlertDispatcher) -> Self {
        Self { engine, alerts }
    }

    /// Serves one connection: reads a request, writes the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be read or the response
    /// cannot be written.
    pub async fn serve(&self, mut stream: UnixStream) -> Result<()> {
        let request = IpcServer::receive_request(&mut stream).await?;
        debug!(?request, "IPC request received");
        let response = self.handle(request).await;
        IpcServer::send_response(&mut stream, &response).await
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start => self.handle_start().await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Stop => self.handle_stop().await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Notify => self.handle_notify().await,
            IpcRequest::Speak { text } => self.handle_speak(text).await,
        }
    }

    /// Takes a snapshot of the engine together with the mirrored authorization.
    async fn snapshot(&self) -> TimerSnapshot {
        let engine = self.engine.lock().await;
        TimerSnapshot::new(engine.session(), self.alerts.notifier().authorization())
    }

    /// Handles the start command.
    async fn handle_start(&self) -> IpcResponse {
        self.engine.lock().await.start();
        IpcResponse::success("Timer started", Some(self.snapshot().await))
    }

    /// Handles the pause command.
    async fn handle_pause(&self) -> IpcResponse {
        self.engine.lock().await.pause();
        IpcResponse::success("Timer paused", Some(self.snapshot().await))
    }

    /// Handles the stop command.
    async fn handle_stop(&self) -> IpcResponse {
        self.engine.lock().await.stop();
        IpcResponse::success("Timer stopped", Some(self.snapshot().await))
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        IpcResponse::success("", Some(self.snapshot().await))
    }

    /// Handles the notification permission request.
    ///
    /// The engine lock is not held while the host answers.
    async fn handle_notify(&self) -> IpcResponse {
        match self.alerts.notifier().request_authorization().await {
            Ok(authorization) if authorization.is_granted() => {
                IpcResponse::success("Notifications enabled", Some(self.snapshot().await))
            }
            Ok(_) => IpcResponse::success(
                "Notifications are not available on this host",
                Some(self.snapshot().await),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles an ad-hoc utterance.
    async fn handle_speak(&self, text: String) -> IpcResponse {
        if sanitize_utterance(&text).is_none() {
            return IpcResponse::error("Nothing to speak");
        }

        match self.alerts.speaker().speak(&text).await {
            Ok(()) if self.alerts.speaker().is_available() => IpcResponse::success("Speaking", None),
            Ok(()) => IpcResponse::success("Speech is not available on this host", None),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
