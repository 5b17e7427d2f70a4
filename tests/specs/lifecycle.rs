// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations from creation to a terminal status.

use fq_core::{AppCounts, AppResults, EXPIRED_ERROR};
use fq_engine::EngineError;

use crate::prelude::*;

#[tokio::test]
async fn three_agents_pick_up_and_succeed() {
    let ctx = setup();
    let id = ctx.create(request(Action::Reboot, &["a1", "a2", "a3"])).await;

    for name in ["a1", "a2", "a3"] {
        let delivered = ctx.checkin(name).await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].agent_id, agent(name));
        assert_eq!(delivered[0].operation_id, id);
    }
    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!(op.status, OperationStatus::ResultsIncomplete);
    assert_eq!(op.agents.pending_results, 3);

    ctx.clock.advance(Duration::from_secs(30));
    for name in ["a1", "a2", "a3"] {
        ctx.engine.report_result(result(&id, name, "true")).unwrap();
    }

    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!(op.status, OperationStatus::ResultsCompleted);
    assert_eq!(op.agents.completed, 3);
    assert_eq!(op.completed_at_ms, Some(1_030_000));
    for name in ["a1", "a2", "a3"] {
        assert!(ctx.engine.queue(&agent(name)).is_empty());
    }
}

#[tokio::test]
async fn abandoned_entry_expires_on_sweep() {
    let ctx = setup();
    let id = ctx.create(request(Action::Reboot, &["a1"])).await;
    ctx.clock.advance(SERVER_TTL + Duration::from_secs(1));

    let report = ctx.engine.sweep().await.unwrap();
    assert_eq!(report.expired, 1);
    assert!(ctx.engine.queue(&agent("a1")).is_empty());

    let tracker = ctx.store.agents.get(&(id.clone(), agent("a1"))).unwrap();
    assert_eq!(tracker.status, AgentOperationStatus::OperationExpired);
    assert_eq!(tracker.errors.as_deref(), Some(EXPIRED_ERROR));

    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!(op.agents.expired, 1);
    assert_eq!(op.status, OperationStatus::ResultsCompletedFailed);
    assert!(op.completed_at_ms.is_some());
}

#[tokio::test]
async fn mixed_app_results_roll_up_with_errors() {
    let ctx = setup();
    let id = ctx
        .create(request(Action::InstallOsApps, &["a1"]).apps_for("a1", apps(&["app1", "app2"])))
        .await;
    ctx.checkin("a1").await;

    ctx.engine.report_app_result(app_result(&id, "a1", "app1", "true")).await.unwrap();
    ctx.engine.report_app_result(app_result(&id, "a1", "app2", "false")).await.unwrap();

    let tracker = ctx.store.agents.get(&(id.clone(), agent("a1"))).unwrap();
    assert_eq!(tracker.apps, Some(AppCounts { total: 2, pending: 0, completed: 1, failed: 1 }));
    assert_eq!(tracker.status, AgentOperationStatus::CompletedWithErrors);

    let rows = ctx.store.apps_of(&id, &agent("a1"));
    let results: Vec<AppResults> = rows.iter().map(|r| r.results).collect();
    assert!(results.contains(&AppResults::Received) && results.contains(&AppResults::ReceivedWithErrors));

    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!(op.status, OperationStatus::ResultsCompletedWithErrors);
}

#[tokio::test]
async fn partial_targets_are_reported_to_the_creator() {
    let ctx = setup();
    ctx.directory.set_tag("lab", &["a2", "a3"]);
    ctx.directory.disable("a3");

    let created = ctx
        .engine
        .create_operation(request(Action::Reboot, &["a1", "a2"]).tag_id("lab"))
        .await
        .unwrap();

    assert_eq!(created.targets, vec![agent("a1"), agent("a2")]);
    assert_eq!(created.operation.agents.total, 2);
    assert_eq!(created.failures.len(), 1);
    assert_eq!(created.failures[0].agent_id, agent("a3"));
    assert!(ctx.engine.queue(&agent("a3")).is_empty());
}

#[tokio::test]
async fn unacked_delivery_is_redelivered_after_visibility_timeout() {
    let ctx = setup();
    let id = ctx.create(request(Action::Reboot, &["a1"])).await;

    assert_eq!(ctx.checkin("a1").await.len(), 1);
    assert!(ctx.checkin("a1").await.is_empty());

    ctx.clock.advance(Duration::from_millis(ctx.engine.config().visibility_timeout_ms));
    let again = ctx.checkin("a1").await;
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].operation_id, id);

    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!(op.agents.pending_results, 1);
    assert!(op.agents.is_balanced());
}

#[tokio::test]
async fn result_for_unknown_pair_is_rejected() {
    let ctx = setup();
    let id = ctx.create(request(Action::Reboot, &["a1"])).await;

    let err = ctx.engine.report_result(result(&id, "a9", "true")).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperationId { .. }));

    let err = ctx.engine.report_result(result(&id, "a1", "yes")).unwrap_err();
    assert!(matches!(err, EngineError::InvalidSuccessValue(_)));
    assert_eq!(ctx.store.operations.get(&id).unwrap().status, OperationStatus::Created);
}
