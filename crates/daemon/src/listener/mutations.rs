// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers that change engine state.

use fq_core::AgentId;
use fq_engine::{AppResultReport, CreateOperation, ResultReceipt, ResultReport};
use fq_wire::Response;
use tracing::warn;

use super::errors::{error_response, failure_entry};
use super::ListenCtx;

pub(super) async fn handle_create(ctx: &ListenCtx, req: CreateOperation) -> Response {
    match ctx.engine.create_operation(req).await {
        Ok(created) => Response::OperationCreated {
            operation: created.operation,
            targets: created.targets,
            failures: created.failures.into_iter().map(failure_entry).collect(),
        },
        Err(e) => {
            warn!(error = %e, "create operation rejected");
            error_response(&e)
        }
    }
}

pub(super) async fn handle_checkin(ctx: &ListenCtx, agent_id: AgentId) -> Response {
    match ctx.engine.checkin(&agent_id).await {
        Ok(entries) => Response::Entries { entries },
        Err(e) => {
            warn!(%agent_id, error = %e, "check-in rejected");
            error_response(&e)
        }
    }
}

pub(super) fn handle_report(ctx: &ListenCtx, report: ResultReport) -> Response {
    let (operation_id, agent_id) = (report.operation_id.clone(), report.agent_id.clone());
    match ctx.engine.report_result(report) {
        Ok(receipt) => recorded(receipt),
        Err(e) => {
            warn!(%operation_id, %agent_id, error = %e, "result rejected");
            error_response(&e)
        }
    }
}

pub(super) async fn handle_app_report(ctx: &ListenCtx, report: AppResultReport) -> Response {
    let (operation_id, agent_id, app_id) =
        (report.operation_id.clone(), report.agent_id.clone(), report.app_id.clone());
    match ctx.engine.report_app_result(report).await {
        Ok(receipt) => recorded(receipt),
        Err(e) => {
            warn!(%operation_id, %agent_id, %app_id, error = %e, "app result rejected");
            error_response(&e)
        }
    }
}

pub(super) async fn handle_sweep(ctx: &ListenCtx) -> Response {
    match ctx.engine.sweep().await {
        Some(report) => {
            Response::Swept { examined: report.examined, expired: report.expired, skipped: false }
        }
        None => Response::Swept { examined: 0, expired: 0, skipped: true },
    }
}

fn recorded(receipt: ResultReceipt) -> Response {
    Response::ResultRecorded {
        agent_status: receipt.agent_status,
        operation_status: receipt.operation_status,
        duplicate: receipt.duplicate,
    }
}

#[cfg(test)]
#[path = "mutations_tests.rs"]
mod tests;
