// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fqd: fleetq daemon serving the operation queue over a Unix socket

mod config;
mod env;
mod lifecycle;
mod listener;

use std::process::ExitCode;
use std::sync::Arc;

use fq_engine::run_sweeper;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::lifecycle::{run_checkpointer, Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fqd: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("fqd: failed to open log: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Daemon failed: {}", e);
            eprintln!("fqd: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to `<state_dir>/daemon.log`, filtered by `RUST_LOG` (default `info`).
fn init_logging(config: &Config) -> Result<WorkerGuard, std::io::Error> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file_name = config.log_path.file_name().unwrap_or_else(|| "daemon.log".as_ref());
    let appender = tracing_appender::rolling::never(&config.state_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

async fn run(config: Config) -> Result<(), LifecycleError> {
    let StartupResult { mut daemon, listener } = lifecycle::startup(&config).await?;

    let shutdown = Arc::new(Notify::new());
    let auth_token = env::auth_token();
    let ctx = Arc::new(ListenCtx {
        engine: Arc::clone(&daemon.engine),
        start_time: daemon.start_time,
        shutdown: Arc::clone(&shutdown),
        auth_token: auth_token.clone(),
    });
    let listener = match env::tcp_port() {
        Some(port) => {
            let tcp = TcpListener::bind(("0.0.0.0", port))
                .await
                .map_err(|e| LifecycleError::TcpBindFailed(port, e))?;
            if auth_token.is_none() {
                warn!(port, "TCP listener has no FQ_AUTH_TOKEN; accepting any Hello");
            }
            info!(port, "Listening on TCP");
            Listener::with_tcp(listener, tcp, ctx)
        }
        None => Listener::new(listener, ctx),
    };
    let listener_task = tokio::spawn(listener.run());

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(run_sweeper(
        Arc::clone(&daemon.engine),
        daemon.settings.sweep_interval(),
        cancel.clone(),
    ));
    let checkpointer = tokio::spawn(run_checkpointer(
        Arc::clone(daemon.engine.store()),
        config.snapshot_path.clone(),
        daemon.settings.checkpoint_interval(),
        cancel.clone(),
    ));

    info!(socket = %config.socket_path.display(), "READY");

    wait_for_shutdown(&shutdown).await;

    listener_task.abort();
    cancel.cancel();
    if let Err(e) = sweeper.await {
        warn!("Sweeper task ended abnormally: {}", e);
    }
    if let Err(e) = checkpointer.await {
        warn!("Checkpoint task ended abnormally: {}", e);
    }
    daemon.shutdown()
}

/// Resolve on a Shutdown request, SIGINT, or SIGTERM.
async fn wait_for_shutdown(shutdown: &Notify) {
    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                None
            }
        };
    let terminate = async {
        match sigterm.as_mut() {
            Some(signal) => {
                signal.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown.notified() => info!("Shutdown requested"),
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
