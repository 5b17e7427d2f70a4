// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fq_core::{AgentCounts, AgentOutcome, OperationStatus, PendingStage};
use std::sync::Arc;

fn store_with(total: u32) -> (Store, OperationId) {
    let store = Store::new();
    let id = OperationId::from_string("op-ledger");
    let op = Operation::builder().id(id.clone()).agents(AgentCounts::new(total)).build();
    store.operations.insert(id.clone(), op).unwrap();
    (store, id)
}

const DONE: Rollup = Rollup::Finished { from: PendingStage::Pickup, outcome: AgentOutcome::Completed };

#[test]
fn rollup_updates_counters_and_status() {
    let (store, id) = store_with(1);
    let op = apply_rollup(&store, &id, DONE, 2_000_000).unwrap();
    assert_eq!(op.status, OperationStatus::ResultsCompleted);
    assert_eq!(store.operations.get(&id).unwrap(), op);
}

#[test]
fn rollup_on_terminal_ledger_returns_current_row() {
    let (store, id) = store_with(1);
    apply_rollup(&store, &id, DONE, 2_000_000).unwrap();
    let version = store.operations.get_versioned(&id).unwrap().version;

    let op = apply_rollup(&store, &id, DONE, 3_000_000).unwrap();
    assert_eq!(op.completed_at_ms, Some(2_000_000));
    assert_eq!(store.operations.get_versioned(&id).unwrap().version, version);
}

#[test]
fn rollup_for_missing_operation_fails_to_update() {
    let store = Store::new();
    let id = OperationId::from_string("op-missing");
    assert_eq!(
        apply_rollup(&store, &id, DONE, 1).unwrap_err(),
        EngineError::ResultsFailedToUpdate(id)
    );
}

#[test]
fn concurrent_rollups_are_all_counted() {
    let (store, id) = store_with(64);
    let store = Arc::new(store);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let (store, id) = (store.clone(), id.clone());
            std::thread::spawn(move || {
                for _ in 0..8 {
                    // Contention may exhaust attempts; retry like a caller would
                    while apply_rollup(&store, &id, DONE, 2_000_000).is_err() {}
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let op = store.operations.get(&id).unwrap();
    assert_eq!(op.agents.completed, 64);
    assert_eq!(op.agents.pending(), 0);
    assert_eq!(op.status, OperationStatus::ResultsCompleted);
}
