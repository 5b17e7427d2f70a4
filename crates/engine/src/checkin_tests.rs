// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use crate::test_helpers::{request, setup, setup_with};
use crate::{EngineConfig, EngineError};
use fq_core::{Action, AgentId, AgentOperationStatus, OperationStatus};

#[tokio::test]
async fn checkin_delivers_in_order_and_marks_pickup() {
    let ctx = setup();
    let first = ctx.create(request(Action::Reboot, &["a1", "a2"])).await;
    let second = ctx.create(request(Action::Shutdown, &["a1"])).await;

    let delivered = ctx.checkin("a1").await;
    assert_eq!(
        delivered.iter().map(|e| e.operation_id.clone()).collect::<Vec<_>>(),
        vec![first.clone(), second.clone()]
    );

    let op = ctx.store.operations.get(&first).unwrap();
    assert_eq!(op.agents.pending_pickup, 1);
    assert_eq!(op.agents.pending_results, 1);
    assert_eq!(op.status, OperationStatus::ResultsIncomplete);
    assert!(op.agents.is_balanced());

    let tracker = ctx.store.agents.get(&(first, AgentId::new("a1"))).unwrap();
    assert_eq!(tracker.status, AgentOperationStatus::PickedUp);
    assert_eq!(tracker.picked_up_at_ms, Some(1_000_000));
}

#[tokio::test]
async fn leased_entries_are_hidden_until_the_visibility_timeout() {
    let ctx = setup();
    let id = ctx.create(request(Action::Reboot, &["a1"])).await;

    assert_eq!(ctx.checkin("a1").await.len(), 1);
    assert!(ctx.checkin("a1").await.is_empty());
    assert_eq!(ctx.engine.queue(&AgentId::new("a1")).len(), 1);

    ctx.clock.advance(Duration::from_secs(61));
    let again = ctx.checkin("a1").await;
    assert_eq!(again.len(), 1);

    // Redelivery does not count a second pickup
    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!(op.agents.pending_results, 1);
    assert_eq!(op.agents.pending_pickup, 0);
}

#[tokio::test]
async fn ack_removes_delivered_entries() {
    let ctx = setup();
    ctx.create(request(Action::Reboot, &["a1", "a2"])).await;
    let delivered = ctx.checkin("a1").await;
    let ids: Vec<_> = delivered.iter().map(|e| e.id.clone()).collect();

    // Acks from another agent are ignored
    assert_eq!(ctx.engine.ack(&AgentId::new("a2"), &ids), 0);
    assert_eq!(ctx.engine.ack(&AgentId::new("a1"), &ids), 1);
    assert!(ctx.engine.queue(&AgentId::new("a1")).is_empty());
    assert_eq!(ctx.engine.ack(&AgentId::new("a1"), &ids), 0);
}

#[tokio::test]
async fn zero_visibility_pops_entries() {
    let ctx = setup_with(EngineConfig { visibility_timeout_ms: 0 });
    ctx.create(request(Action::Reboot, &["a1"])).await;

    assert_eq!(ctx.checkin("a1").await.len(), 1);
    assert!(ctx.engine.queue(&AgentId::new("a1")).is_empty());
    assert!(ctx.checkin("a1").await.is_empty());
}

#[tokio::test]
async fn disabled_agent_cannot_check_in() {
    let ctx = setup();
    ctx.create(request(Action::Reboot, &["a1"])).await;
    ctx.directory.disable("a1");

    let err = ctx.engine.checkin(&AgentId::new("a1")).await.unwrap_err();
    assert_eq!(err, EngineError::AgentDisabled(AgentId::new("a1")));
    assert_eq!(ctx.engine.queue(&AgentId::new("a1")).len(), 1);
}

#[tokio::test]
async fn unknown_agent_gets_nothing() {
    let ctx = setup();
    assert!(ctx.checkin("nobody").await.is_empty());
}

#[tokio::test]
async fn entries_past_deadline_are_expired_not_delivered() {
    let ctx = setup();
    let id = ctx.create(request(Action::Reboot, &["a1"])).await;
    ctx.clock.advance(Duration::from_secs(10 * 60));

    assert!(ctx.checkin("a1").await.is_empty());
    assert!(ctx.engine.queue(&AgentId::new("a1")).is_empty());

    let tracker = ctx.store.agents.get(&(id.clone(), AgentId::new("a1"))).unwrap();
    assert_eq!(tracker.status, AgentOperationStatus::OperationExpired);
    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!(op.agents.expired, 1);
    assert_eq!(op.status, OperationStatus::ResultsCompletedFailed);
}
