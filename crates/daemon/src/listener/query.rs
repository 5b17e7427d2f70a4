// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only handlers.

use fq_wire::{OperationDetail, Query, Response};

use super::errors::error_response;
use super::ListenCtx;

pub(super) fn handle_query(ctx: &ListenCtx, query: Query) -> Response {
    match query {
        Query::GetOperation { operation_id } => match ctx.engine.get_operation(&operation_id) {
            Ok(detail) => Response::Operation {
                detail: Box::new(OperationDetail {
                    operation: detail.operation,
                    agents: detail.agents,
                    apps: detail.apps,
                }),
            },
            Err(e) => error_response(&e),
        },
        Query::ListOperations { filter } => {
            let page = ctx.engine.list_operations(&filter);
            Response::Operations { operations: page.operations, total: page.total }
        }
        Query::AgentQueue { agent_id } => Response::Entries { entries: ctx.engine.queue(&agent_id) },
    }
}

pub(super) fn handle_status(ctx: &ListenCtx) -> Response {
    let store = ctx.engine.store();
    let operations = store.operations.len();
    let operations_active = store.operations.filter(|op| !op.is_terminal()).len();
    Response::Status {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        operations,
        operations_active,
        queued_entries: store.queue.len(),
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
