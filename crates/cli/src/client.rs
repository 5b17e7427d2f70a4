// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: one request per Unix socket connection.

use std::path::PathBuf;
use std::time::Duration;

use fq_wire::{ErrorKind, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::env;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{kind}: {message}")]
    Rejected { kind: ErrorKind, message: String, retryable: bool },

    #[error("Unexpected response from daemon: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// The daemon is absent or its socket is stale.
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl DaemonClient {
    /// Client for the daemon under the resolved state directory.
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = env::state_dir().ok_or(ClientError::NoStateDir)?.join("daemon.sock");
        Self::at(socket_path, env::ipc_timeout())
    }

    pub fn at(socket_path: PathBuf, timeout: Duration) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path, timeout })
    }

    /// Send a request and wait for its response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();
        fq_wire::write_request(&mut writer, request, self.timeout).await?;
        Ok(fq_wire::read_response(&mut reader, self.timeout).await?)
    }

    /// Turn an error or unexpected response into a `ClientError`.
    pub(crate) fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { kind, message, retryable } => {
                Err(ClientError::Rejected { kind, message, retryable })
            }
            other => Err(ClientError::UnexpectedResponse(format!("{other:?}"))),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
