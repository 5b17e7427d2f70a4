// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fq daemon` - Daemon management commands

use std::io::{BufRead, BufReader};

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::{format_elapsed, format_or_json, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Check daemon status
    Status,
    /// Print daemon version
    Version,
    /// Stop the daemon
    Stop,
    /// Run an expiration sweep now
    Sweep,
    /// View daemon logs
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "200")]
        limit: usize,
    },
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Status => status(format).await,
        DaemonCommand::Version => version(format).await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Sweep => sweep(format).await,
        DaemonCommand::Logs { limit } => logs(limit),
    }
}

async fn status(format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => return print_not_running(format),
    };
    let status = match client.status().await {
        Ok(status) => status,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(e.into()),
    };
    let version = client.hello().await.unwrap_or_else(|_| "unknown".to_string());

    let obj = serde_json::json!({
        "status": "running",
        "version": version,
        "uptime_secs": status.uptime_secs,
        "operations": status.operations,
        "operations_active": status.operations_active,
        "queued_entries": status.queued_entries,
    });
    format_or_json(format, &obj, || {
        println!("Status: running");
        println!("Version: {}", version);
        println!("Uptime: {}", format_elapsed(status.uptime_secs));
        println!("Operations: {} active, {} total", status.operations_active, status.operations);
        println!("Queued entries: {}", status.queued_entries);
    })
}

async fn version(format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => return print_not_running(format),
    };
    let version = match client.hello().await {
        Ok(v) => v,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(_) => "unknown".to_string(),
    };
    let obj = serde_json::json!({ "version": version });
    format_or_json(format, &obj, || println!("fqd {}", version))
}

async fn stop() -> Result<()> {
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => {
            println!("Daemon not running");
            return Ok(());
        }
    };
    match client.shutdown().await {
        Ok(()) => {
            println!("Daemon stopping");
            Ok(())
        }
        Err(e) if e.is_not_running() => {
            println!("Daemon not running");
            Ok(())
        }
        Err(e) => Err(anyhow!("Failed to stop daemon: {}", e)),
    }
}

async fn sweep(format: OutputFormat) -> Result<()> {
    let client = DaemonClient::connect()?;
    let swept = client.sweep().await?;
    format_or_json(format, &swept, || {
        if swept.skipped {
            println!("Sweep skipped: another sweep is running");
        } else {
            println!("Swept {} entries, {} expired", swept.examined, swept.expired);
        }
    })
}

fn logs(limit: usize) -> Result<()> {
    let dir = crate::env::state_dir().ok_or_else(|| anyhow!("Could not determine state directory"))?;
    let path = dir.join("daemon.log");
    let file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("No log file found at {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let lines: Vec<String> = BufReader::new(file).lines().collect::<Result<_, _>>()?;
    for line in tail(&lines, limit) {
        println!("{line}");
    }
    Ok(())
}

fn tail(lines: &[String], limit: usize) -> &[String] {
    &lines[lines.len().saturating_sub(limit)..]
}

fn print_not_running(format: OutputFormat) -> Result<()> {
    let obj = serde_json::json!({ "status": "not_running" });
    format_or_json(format, &obj, || println!("Daemon not running"))
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
