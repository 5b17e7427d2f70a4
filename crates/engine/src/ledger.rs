// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger rollups via compare-and-swap.
//!
//! Every rollup re-reads the ledger row, applies the counter movement to a
//! copy, and swaps it in only if no other writer committed in between.

use fq_core::{Operation, OperationId, Rollup};
use fq_storage::{CasOutcome, Store};
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Attempts before a contended rollup gives up
pub(crate) const MAX_CAS_ATTEMPTS: usize = 16;

/// Apply `rollup` to the operation's counters and recompute its status.
///
/// Returns the ledger row as it stands afterwards. A rollup the counters
/// absorb (terminal ledger) returns the current row unchanged.
pub(crate) fn apply_rollup(
    store: &Store,
    operation_id: &OperationId,
    rollup: Rollup,
    now_ms: u64,
) -> Result<Operation, EngineError> {
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let Some(current) = store.operations.get_versioned(operation_id) else {
            warn!(%operation_id, ?rollup, "rollup for missing operation");
            return Err(EngineError::ResultsFailedToUpdate(operation_id.clone()));
        };
        let mut next = current.value.clone();
        if !next.apply_rollup(rollup, now_ms) {
            return Ok(current.value);
        }

        match store.operations.compare_and_swap(operation_id, current.version, next.clone()) {
            CasOutcome::Swapped { .. } => {
                if next.is_terminal() {
                    info!(
                        %operation_id,
                        status = %next.status,
                        completed = next.agents.completed,
                        with_errors = next.agents.completed_with_errors,
                        failed = next.agents.failed,
                        expired = next.agents.expired,
                        "operation finished"
                    );
                }
                return Ok(next);
            }
            CasOutcome::Conflict { current } => {
                debug!(%operation_id, attempt, version = current, "ledger contended, retrying");
            }
            CasOutcome::Absent => break,
        }
    }
    warn!(%operation_id, ?rollup, "ledger rollup did not apply");
    Err(EngineError::ResultsFailedToUpdate(operation_id.clone()))
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
