// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and serving
//! one request per connection against the shared engine.

mod errors;
mod mutations;
mod query;

use std::sync::Arc;
use std::time::Instant;

use fq_wire::{ErrorKind, ProtocolError, Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::env::ipc_timeout;
use crate::lifecycle::DaemonEngine;

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx {
    pub engine: Arc<DaemonEngine>,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
    /// Auth token for TCP connections (from `FQ_AUTH_TOKEN`).
    /// When set, TCP clients must provide this token in the Hello handshake.
    pub auth_token: Option<String>,
}

/// Listener task for accepting socket connections.
pub(crate) struct Listener {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    /// Create a new listener with Unix socket only.
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: None, ctx }
    }

    /// Create a new listener with both Unix socket and TCP.
    pub fn with_tcp(unix: UnixListener, tcp: TcpListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: Some(tcp), ctx }
    }

    /// Run the listener loop, spawning tasks for each connection.
    pub async fn run(mut self) {
        match self.tcp.take() {
            Some(tcp) => self.run_dual(tcp).await,
            None => self.run_unix_only().await,
        }
    }

    async fn run_unix_only(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) =
                            handle_connection(reader, writer, ConnectionSource::Unix, &ctx).await
                        {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("Unix accept error: {}", e),
            }
        }
    }

    async fn run_dual(self, tcp: TcpListener) {
        loop {
            tokio::select! {
                result = self.unix.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, ConnectionSource::Unix, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("Unix accept error: {}", e),
                    }
                }
                result = tcp.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("TCP connection from {}", addr);
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, ConnectionSource::Tcp, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("TCP accept error: {}", e),
                    }
                }
            }
        }
    }
}

/// Source of a connection (for auth decisions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionSource {
    /// Local Unix socket, trusted
    Unix,
    /// Remote TCP, authenticated by the Hello handshake
    Tcp,
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("Client disconnected"),
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("Connection timeout"),
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// The handler races against client disconnect detection; if the client
/// closes the connection first the handler future is dropped.
async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    source: ConnectionSource,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let request = match fq_wire::read_request(&mut reader, ipc_timeout()).await {
        Ok(request) => request,
        Err(ProtocolError::Json(e)) => {
            warn!(error = %e, "malformed request");
            let response = Response::error(ErrorKind::BadRequest, e.to_string());
            fq_wire::write_response(&mut writer, &response, ipc_timeout()).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // TCP connections must authenticate via Hello handshake as the first request
    if source == ConnectionSource::Tcp {
        if let Some(rejection) = check_tcp_hello(&request, ctx.auth_token.as_deref()) {
            warn!("rejected TCP request");
            let _ = fq_wire::write_response(&mut writer, &rejection, ipc_timeout()).await;
            return Ok(());
        }
    }

    // Log queries at debug level (frequent polling), other requests at info
    if request.is_query() {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = tokio::select! {
        response = handle_request(request, ctx) => response,
        _ = detect_client_disconnect(&mut reader) => {
            debug!("Client disconnected, cancelling handler");
            return Ok(());
        }
    };

    debug!("Sending response: {:?}", response);
    fq_wire::write_response(&mut writer, &response, ipc_timeout()).await?;
    Ok(())
}

/// Rejection for a TCP request that is not an authorized Hello.
fn check_tcp_hello(request: &Request, expected: Option<&str>) -> Option<Response> {
    let Request::Hello { token, .. } = request else {
        return Some(Response::error(ErrorKind::Unauthorized, "TCP connections must start with Hello"));
    };
    match expected {
        // No auth_token configured on daemon; allow all TCP connections
        None => None,
        Some(expected) if token.as_deref() == Some(expected) => None,
        Some(_) => Some(Response::error(ErrorKind::Unauthorized, "unauthorized")),
    }
}

/// Detect client disconnect by reading from the socket after the request.
///
/// The client sends one request then waits, so a read only returns on EOF.
async fn detect_client_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request and return a response.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        // TCP auth already happened in handle_connection
        Request::Hello { .. } => Response::Hello { version: PROTOCOL_VERSION.to_string() },

        Request::Query { query } => query::handle_query(ctx, query),

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::Status => query::handle_status(ctx),

        Request::CreateOperation {
            action,
            plugin,
            agent_ids,
            tag_id,
            created_by,
            view_name,
            throttle,
            server_ttl_minutes,
            agent_deadline_ms,
            payload,
            apps,
        } => {
            let req = fq_engine::CreateOperation {
                action,
                plugin,
                agent_ids,
                tag_id,
                created_by,
                view_name,
                throttle,
                server_ttl_minutes,
                agent_deadline_ms,
                payload,
                apps,
            };
            mutations::handle_create(ctx, req).await
        }

        Request::Checkin { agent_id } => mutations::handle_checkin(ctx, agent_id).await,

        Request::Ack { agent_id, entry_ids } => {
            Response::Acked { removed: ctx.engine.ack(&agent_id, &entry_ids) }
        }

        Request::ReportResult { operation_id, agent_id, success, error, status_code } => {
            let report =
                fq_engine::ResultReport { operation_id, agent_id, success, error, status_code };
            mutations::handle_report(ctx, report)
        }

        Request::ReportAppResult {
            operation_id,
            agent_id,
            app_id,
            success,
            error,
            status_code,
            apps_to_add,
            apps_to_delete,
            reboot_required,
        } => {
            let report = fq_engine::AppResultReport {
                operation_id,
                agent_id,
                app_id,
                success,
                error,
                status_code,
                apps_to_add,
                apps_to_delete,
                reboot_required,
            };
            mutations::handle_app_report(ctx, report).await
        }

        Request::Sweep => mutations::handle_sweep(ctx).await,
    }
}

#[cfg(test)]
pub(crate) fn test_ctx(settings: &crate::config::Settings) -> ListenCtx {
    let engine = fq_engine::Engine::new(
        fq_engine::EngineDeps {
            directory: settings.directory(),
            views: settings.views(),
            inventory: fq_adapters::TracingInventory,
            store: Arc::new(fq_storage::Store::new()),
        },
        fq_core::SystemClock,
        settings.engine_config(),
    );
    ListenCtx {
        engine: Arc::new(engine),
        start_time: Instant::now(),
        shutdown: Arc::new(Notify::new()),
        auth_token: None,
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
