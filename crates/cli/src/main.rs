// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fq - fleet operation queue CLI

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod client_queries;
mod commands;
mod env;
mod exit_error;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::{ClientError, DaemonClient};
use crate::commands::{agent, daemon, operation};
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

#[derive(Parser)]
#[command(name = "fq", version = VERSION, about = "Queue operations for remote agents")]
pub(crate) struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    /// Shorthand for `-o json`
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create and inspect operations
    Operation(operation::OperationArgs),
    /// Act as an agent: check in, ack, report results
    Agent(agent::AgentArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let exit = exit_for(e);
            eprintln!("Error: {}", exit.message);
            ExitCode::from(u8::try_from(exit.code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.format();
    match cli.command {
        Commands::Daemon(args) => daemon::daemon(args, format).await,
        Commands::Operation(args) => {
            let client = DaemonClient::connect()?;
            operation::handle(args.command, &client, format).await
        }
        Commands::Agent(args) => {
            let client = DaemonClient::connect()?;
            agent::handle(args.command, &client, format).await
        }
    }
}

/// Map a command error to the process exit it should produce.
fn exit_for(error: anyhow::Error) -> ExitError {
    let error = match error.downcast::<ExitError>() {
        Ok(exit) => return exit,
        Err(e) => e,
    };
    match error.downcast::<ClientError>() {
        Ok(client) => ExitError::from(client),
        Err(e) => ExitError::new(1, format!("{e:#}")),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
