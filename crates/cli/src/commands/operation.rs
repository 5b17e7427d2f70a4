// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fq operation` - Create and inspect operations

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use fq_core::{
    short, Action, AgentId, AppId, AppSpec, OperationFilter, OperationId, Plugin, SortKey,
    SortOrder, TagId, Throttle, DEFAULT_PAGE_SIZE,
};
use fq_wire::Request;

use crate::client::DaemonClient;
use crate::output::{format_or_json, format_time_ago, handle_list, now_ms, OutputFormat, Table};

#[derive(Args)]
pub struct OperationArgs {
    #[command(subcommand)]
    pub command: OperationCommand,
}

#[derive(Subcommand)]
pub enum OperationCommand {
    /// Create an operation and queue it for its targets
    Create {
        /// Action to perform (e.g. reboot, install_os_apps)
        #[arg(value_parser = parse_action)]
        action: Action,
        /// Target agent (repeatable)
        #[arg(long = "agent")]
        agents: Vec<AgentId>,
        /// Target every agent in a tag
        #[arg(long)]
        tag: Option<TagId>,
        /// View the operation belongs to
        #[arg(long, default_value = "global")]
        view: String,
        /// Plugin override (core, patching, remote_access, monitoring)
        #[arg(long, value_parser = parse_plugin)]
        plugin: Option<Plugin>,
        /// Creator recorded on the operation (default: $USER)
        #[arg(long)]
        created_by: Option<String>,
        /// Server-side queue TTL override, in minutes
        #[arg(long)]
        server_ttl_minutes: Option<u64>,
        /// Absolute agent deadline, epoch milliseconds
        #[arg(long)]
        agent_deadline_ms: Option<u64>,
        /// Throttle policy as JSON, e.g. '{"cpu_throttle":"idle"}'
        #[arg(long, value_parser = parse_throttle)]
        throttle: Option<Throttle>,
        /// Payload handed to agents as JSON
        #[arg(long, value_parser = parse_json)]
        payload: Option<serde_json::Value>,
        /// App for an app-scoped action: AGENT=APP_ID[:NAME[:VERSION]] (repeatable)
        #[arg(long = "app", value_parser = parse_app)]
        apps: Vec<(AgentId, AppSpec)>,
    },
    /// Show an operation with its per-agent and per-app rows
    Show {
        /// Operation ID
        id: String,
    },
    /// List operations, newest first
    List(ListArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Only operations in this view
    #[arg(long)]
    pub view: Option<String>,
    /// Only operations targeting this agent
    #[arg(long)]
    pub agent: Option<AgentId>,
    /// Only operations created for this tag
    #[arg(long)]
    pub tag: Option<TagId>,
    /// Only operations of this action
    #[arg(long, value_parser = parse_action)]
    pub action: Option<Action>,
    /// Sort field (action, status, created_at, updated_at, completed_at, created_by)
    #[arg(long, value_parser = parse_sort_key, default_value = "created_at")]
    pub sort: SortKey,
    /// Oldest (or lowest) first
    #[arg(long)]
    pub asc: bool,
    /// Maximum operations to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub limit: usize,
    /// Skip this many operations
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

impl ListArgs {
    pub fn into_filter(self) -> OperationFilter {
        OperationFilter {
            view_name: self.view,
            agent_id: self.agent,
            tag_id: self.tag,
            action: self.action,
            sort_key: self.sort,
            order: if self.asc { SortOrder::Asc } else { SortOrder::Desc },
            count: self.limit,
            offset: self.offset,
        }
    }
}

pub async fn handle(command: OperationCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        OperationCommand::Create {
            action,
            agents,
            tag,
            view,
            plugin,
            created_by,
            server_ttl_minutes,
            agent_deadline_ms,
            throttle,
            payload,
            apps,
        } => {
            let request = Request::CreateOperation {
                action,
                plugin,
                agent_ids: agents,
                tag_id: tag,
                created_by: created_by.unwrap_or_else(crate::env::user),
                view_name: view,
                throttle,
                server_ttl_minutes,
                agent_deadline_ms,
                payload: payload.unwrap_or(serde_json::Value::Null),
                apps: group_apps(apps),
            };
            let created = client.create_operation(&request).await?;
            format_or_json(format, &created, || {
                println!(
                    "Created {} ({}) for {} agent(s)",
                    created.operation.id, created.operation.action, created.targets.len()
                );
                for failure in &created.failures {
                    println!("  skipped {}: {}", failure.agent_id, failure.message);
                }
            })
        }
        OperationCommand::Show { id } => {
            let detail = client.get_operation(OperationId::from_string(id)).await?;
            format_or_json(format, &detail, || {
                let op = &detail.operation;
                let counts = &op.agents;
                println!("Operation: {}", op.id);
                println!("Action:    {} ({})", op.action, op.plugin);
                println!("View:      {}", op.view_name);
                println!("Created:   {} ago by {}", format_time_ago(op.created_at_ms, now_ms()), op.created_by);
                println!("Status:    {}", op.status);
                println!(
                    "Agents:    {} total, {} awaiting pickup, {} awaiting results, {} completed, {} with errors, {} failed, {} expired",
                    counts.total,
                    counts.pending_pickup,
                    counts.pending_results,
                    counts.completed,
                    counts.completed_with_errors,
                    counts.failed,
                    counts.expired
                );
                if !detail.agents.is_empty() {
                    println!();
                    let mut table = Table::new(vec!["AGENT", "STATUS", "ERROR"]);
                    for row in &detail.agents {
                        table.row(vec![
                            row.agent_id.to_string(),
                            row.status.to_string(),
                            row.errors.clone().unwrap_or_default(),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                }
                if !detail.apps.is_empty() {
                    println!();
                    let mut table = Table::new(vec!["AGENT", "APP", "RESULT", "ERROR"]);
                    for row in &detail.apps {
                        table.row(vec![
                            row.agent_id.to_string(),
                            row.app_id.to_string(),
                            row.results.to_string(),
                            row.errors.clone().unwrap_or_default(),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                }
            })
        }
        OperationCommand::List(args) => {
            let (operations, total) = client.list_operations(args.into_filter()).await?;
            let now = now_ms();
            handle_list(format, &operations, "No operations", |items, out| {
                let mut table = Table::new(vec!["ID", "ACTION", "VIEW", "AGENTS", "STATUS", "AGE"]);
                for op in items {
                    table.row(vec![
                        short(op.id.as_str(), 12).to_string(),
                        op.action.to_string(),
                        op.view_name.clone(),
                        op.agents.total.to_string(),
                        op.status.to_string(),
                        format_time_ago(op.created_at_ms, now),
                    ]);
                }
                table.render(out);
                if total > items.len() {
                    let _ = writeln!(out, "\n{} of {total} operations", items.len());
                }
                let _ = out.flush();
            })
        }
    }
}

fn group_apps(apps: Vec<(AgentId, AppSpec)>) -> BTreeMap<AgentId, Vec<AppSpec>> {
    let mut grouped: BTreeMap<AgentId, Vec<AppSpec>> = BTreeMap::new();
    for (agent_id, app) in apps {
        grouped.entry(agent_id).or_default().push(app);
    }
    grouped
}

pub(crate) fn parse_action(s: &str) -> Result<Action, String> {
    Action::parse(s).ok_or_else(|| {
        let names: Vec<String> = Action::ALL.iter().map(|a| a.to_string()).collect();
        format!("unknown action '{s}' (expected one of: {})", names.join(", "))
    })
}

pub(crate) fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    SortKey::parse(s).ok_or_else(|| {
        let names: Vec<String> = SortKey::ALL.iter().map(|k| k.to_string()).collect();
        format!("unknown sort field '{s}' (expected one of: {})", names.join(", "))
    })
}

pub(crate) fn parse_plugin(s: &str) -> Result<Plugin, String> {
    Plugin::parse(s).ok_or_else(|| format!("unknown plugin '{s}'"))
}

pub(crate) fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

pub(crate) fn parse_throttle(s: &str) -> Result<Throttle, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid throttle: {e}"))
}

/// Parse `AGENT=APP_ID[:NAME[:VERSION]]`; the name defaults to the id.
pub(crate) fn parse_app(s: &str) -> Result<(AgentId, AppSpec), String> {
    let (agent, app) = s.split_once('=').ok_or_else(|| format!("'{s}' must be AGENT=APP_ID[:NAME[:VERSION]]"))?;
    let mut parts = app.splitn(3, ':');
    let app_id = parts.next().unwrap_or_default();
    if agent.is_empty() || app_id.is_empty() {
        return Err(format!("'{s}' must be AGENT=APP_ID[:NAME[:VERSION]]"));
    }
    let app_name = parts.next().filter(|n| !n.is_empty()).unwrap_or(app_id).to_string();
    let app_version = parts.next().unwrap_or_default().to_string();
    Ok((AgentId::new(agent), AppSpec { app_id: AppId::new(app_id), app_name, app_version }))
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
