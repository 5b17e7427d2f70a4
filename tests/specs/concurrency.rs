// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent completions must not lose counter updates.

use std::sync::Arc;

use crate::prelude::*;

const FLEET: usize = 40;

fn fleet() -> Vec<String> {
    (0..FLEET).map(|i| format!("agent-{i}")).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_reports_all_land_in_the_ledger() {
    let ctx = setup();
    let names = fleet();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let id = ctx.create(request(Action::Reboot, &refs)).await;
    let engine = Arc::new(ctx.engine);

    let mut tasks = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let engine = Arc::clone(&engine);
        let report = result(&id, name, if i % 4 == 0 { "false" } else { "true" });
        tasks.push(tokio::spawn(async move {
            engine.checkin(&report.agent_id).await.unwrap();
            engine.report_result(report).unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let op = ctx.store.operations.get(&id).unwrap();
    assert!(op.agents.is_balanced(), "{:?}", op.agents);
    assert_eq!(op.agents.pending(), 0);
    assert_eq!(op.agents.completed_with_errors, (FLEET / 4) as u32);
    assert_eq!(op.agents.completed, (FLEET - FLEET / 4) as u32);
    assert_eq!(op.status, OperationStatus::ResultsCompletedWithErrors);
    assert!(op.completed_at_ms.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sweep_racing_reports_accounts_every_agent_once() {
    let ctx = setup();
    let names = fleet();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let id = ctx.create(request(Action::Reboot, &refs)).await;
    ctx.clock.advance(SERVER_TTL);
    let engine = Arc::new(ctx.engine);

    let sweeper = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.sweep().await })
    };
    let mut tasks = Vec::new();
    for name in names.iter().step_by(2) {
        let engine = Arc::clone(&engine);
        let report = result(&id, name, "true");
        tasks.push(tokio::spawn(async move { engine.report_result(report).unwrap() }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    sweeper.await.unwrap();

    let op = ctx.store.operations.get(&id).unwrap();
    assert!(op.agents.is_balanced(), "{:?}", op.agents);
    assert_eq!(op.agents.pending(), 0);
    assert_eq!(op.agents.completed + op.agents.expired, FLEET as u32);
    assert!(op.status.is_terminal());
}
