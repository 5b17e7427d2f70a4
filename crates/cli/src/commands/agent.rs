// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fq agent` - Act as an agent against the queue

use anyhow::Result;
use clap::{Args, Subcommand};
use fq_core::{AgentId, AppId, OperationId, Package, QueueEntry, QueueEntryId};
use fq_wire::Request;

use crate::client::DaemonClient;
use crate::output::{format_or_json, format_time_ago, handle_list, now_ms, OutputFormat, Table};

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Pull pending work for an agent
    Checkin {
        /// Agent ID
        agent: AgentId,
    },
    /// Confirm delivered entries so they are not redelivered
    Ack {
        /// Agent ID
        agent: AgentId,
        /// Queue entry IDs from a checkin
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// Report the agent-level result of a simple action
    Report {
        /// Operation ID
        operation: String,
        /// Agent ID
        agent: AgentId,
        /// "true" or "false"
        #[arg(long)]
        success: String,
        /// Error text reported by the agent
        #[arg(long)]
        error: Option<String>,
        /// Status code reported by the agent
        #[arg(long)]
        status_code: Option<u16>,
    },
    /// Report the result for one application of an app-scoped action
    ReportApp {
        /// Operation ID
        operation: String,
        /// Agent ID
        agent: AgentId,
        /// Application ID
        app: AppId,
        /// "true" or "false"
        #[arg(long)]
        success: String,
        /// Error text reported by the agent
        #[arg(long)]
        error: Option<String>,
        /// Status code reported by the agent
        #[arg(long)]
        status_code: Option<u16>,
        /// Package now installed: NAME[:VERSION] (repeatable)
        #[arg(long = "added", value_parser = parse_package)]
        added: Vec<Package>,
        /// Package removed: NAME[:VERSION] (repeatable)
        #[arg(long = "removed", value_parser = parse_package)]
        removed: Vec<Package>,
        /// The install needs a reboot to finish
        #[arg(long)]
        reboot_required: bool,
    },
    /// Show an agent's pending entries without delivering them
    Queue {
        /// Agent ID
        agent: AgentId,
    },
}

pub async fn handle(command: AgentCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        AgentCommand::Checkin { agent } => {
            let entries = client.checkin(agent).await?;
            handle_list(format, &entries, "No pending work", |items, out| {
                render_entries(items, out)
            })
        }
        AgentCommand::Ack { agent, entries } => {
            let entry_ids = entries.into_iter().map(QueueEntryId::from_string).collect();
            let removed = client.ack(agent, entry_ids).await?;
            format_or_json(format, &serde_json::json!({ "removed": removed }), || {
                println!("Acknowledged {removed} entr{}", if removed == 1 { "y" } else { "ies" });
            })
        }
        AgentCommand::Report { operation, agent, success, error, status_code } => {
            let request = Request::ReportResult {
                operation_id: OperationId::from_string(operation),
                agent_id: agent,
                success,
                error,
                status_code,
            };
            let recorded = client.report(&request).await?;
            format_or_json(format, &recorded, || print_recorded(&recorded))
        }
        AgentCommand::ReportApp {
            operation,
            agent,
            app,
            success,
            error,
            status_code,
            added,
            removed,
            reboot_required,
        } => {
            let request = Request::ReportAppResult {
                operation_id: OperationId::from_string(operation),
                agent_id: agent,
                app_id: app,
                success,
                error,
                status_code,
                apps_to_add: added,
                apps_to_delete: removed,
                reboot_required,
            };
            let recorded = client.report(&request).await?;
            format_or_json(format, &recorded, || print_recorded(&recorded))
        }
        AgentCommand::Queue { agent } => {
            let entries = client.agent_queue(agent).await?;
            handle_list(format, &entries, "Queue is empty", |items, out| {
                render_entries(items, out)
            })
        }
    }
}

fn print_recorded(recorded: &crate::client_queries::Recorded) {
    if recorded.duplicate {
        println!("Already recorded (agent {}, operation {})", recorded.agent_status, recorded.operation_status);
    } else {
        println!("Recorded: agent {}, operation {}", recorded.agent_status, recorded.operation_status);
    }
}

fn render_entries(entries: &[QueueEntry], out: &mut dyn std::io::Write) {
    let now = now_ms();
    let mut table = Table::new(vec!["ENTRY", "OPERATION", "ACTION", "ORDER", "AGE"]);
    for entry in entries {
        table.row(vec![
            entry.id.to_string(),
            entry.operation_id.to_string(),
            entry.action.to_string(),
            entry.order_id.to_string(),
            format_time_ago(entry.created_at_ms, now),
        ]);
    }
    table.render(out);
}

/// Parse `NAME[:VERSION]`.
pub(crate) fn parse_package(s: &str) -> Result<Package, String> {
    let (name, version) = match s.split_once(':') {
        Some((name, version)) => (name, version),
        None => (s, ""),
    };
    if name.is_empty() {
        return Err(format!("'{s}' must be NAME[:VERSION]"));
    }
    Ok(Package { name: name.to_string(), version: version.to_string() })
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
