// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{app_result, apps, request, setup};
use fq_adapters::DirectoryError;
use fq_core::{AgentOperationStatus, AppId, CpuThrottle, RequestMethod, RestartPolicy};
use serde_json::json;
use yare::parameterized;

const NOW: u64 = 1_000_000;
const TEN_MINUTES: u64 = 600_000;

#[tokio::test]
async fn creates_ledger_trackers_and_queue_entries() {
    let ctx = setup();
    let created = ctx.engine.create_operation(request(Action::Reboot, &["a1", "a2", "a3"])).await.unwrap();

    let op = &created.operation;
    assert_eq!(op.status, OperationStatus::Created);
    assert_eq!(op.plugin, Plugin::Core);
    assert_eq!(op.performed_on, PerformedOn::Agent);
    assert_eq!(op.created_by, "admin");
    assert_eq!(op.agents, AgentCounts::new(3));
    assert!(created.failures.is_empty());
    assert_eq!(created.targets, vec![AgentId::new("a1"), AgentId::new("a2"), AgentId::new("a3")]);

    let trackers = ctx.store.agents_of(&op.id);
    assert_eq!(trackers.len(), 3);
    assert!(trackers.iter().all(|t| t.status == AgentOperationStatus::PendingPickup && t.apps.is_none()));

    let queue = ctx.engine.queue(&AgentId::new("a2"));
    assert_eq!(queue.len(), 1);
    let entry = &queue[0];
    assert_eq!(entry.operation_id, op.id);
    assert_eq!(entry.order_id, 1);
    assert_eq!(entry.request_method, RequestMethod::Put);
    assert_eq!(entry.response_uri, "rvl/v2/a2/core/results/reboot");
    assert_eq!(entry.ttl.server_queue_ttl_ms, NOW + TEN_MINUTES);
    assert_eq!(entry.ttl.agent_queue_ttl_ms, NOW + 2 * TEN_MINUTES);
    assert_eq!(entry.ttl.expire_minutes, 10);
}

#[tokio::test]
async fn explicit_agents_come_first_and_tag_members_are_deduplicated() {
    let ctx = setup();
    ctx.directory.set_tag("web", &["a2", "a3", "a2"]);
    let req = request(Action::Reboot, &["a1", "a2", "a1"]).tag_id("web");

    let created = ctx.engine.create_operation(req).await.unwrap();
    assert_eq!(created.targets, vec![AgentId::new("a1"), AgentId::new("a2"), AgentId::new("a3")]);
    assert_eq!(created.operation.performed_on, PerformedOn::Tag);
    assert_eq!(created.operation.tag_id, Some(TagId::new("web")));
    assert_eq!(created.operation.agents.total, 3);
}

#[tokio::test]
async fn disabled_agents_are_reported_not_scheduled() {
    let ctx = setup();
    ctx.directory.disable("a2");

    let created = ctx.engine.create_operation(request(Action::Shutdown, &["a1", "a2"])).await.unwrap();
    assert_eq!(created.targets, vec![AgentId::new("a1")]);
    assert_eq!(created.operation.agents.total, 1);
    assert_eq!(
        created.failures,
        vec![TargetFailure {
            agent_id: AgentId::new("a2"),
            error: EngineError::AgentDisabled(AgentId::new("a2")),
        }]
    );
    assert!(ctx.engine.queue(&AgentId::new("a2")).is_empty());
}

#[tokio::test]
async fn no_enabled_targets_creates_nothing() {
    let ctx = setup();
    ctx.directory.disable("a1");

    let err = ctx.engine.create_operation(request(Action::Reboot, &["a1"])).await.unwrap_err();
    assert_eq!(err, EngineError::NoTargets);
    let err = ctx.engine.create_operation(request(Action::Reboot, &[])).await.unwrap_err();
    assert_eq!(err, EngineError::NoTargets);
    assert!(ctx.store.operations.is_empty());
}

#[tokio::test]
async fn unknown_tag_is_a_directory_error() {
    let ctx = setup();
    let req = request(Action::Reboot, &[]).tag_id("ghost");
    let err = ctx.engine.create_operation(req).await.unwrap_err();
    assert_eq!(err, EngineError::Directory(DirectoryError::UnknownTag(TagId::new("ghost"))));
}

#[tokio::test]
async fn app_scoped_action_needs_apps_for_every_target() {
    let ctx = setup();
    let req = request(Action::InstallOsApps, &["a1", "a2"]).apps_for("a1", apps(&["vim"]));

    let err = ctx.engine.create_operation(req).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::MissingApps { action: Action::InstallOsApps, agent_id: AgentId::new("a2") }
    );
    assert!(ctx.store.operations.is_empty());
}

#[tokio::test]
async fn app_scoped_action_writes_app_rows() {
    let ctx = setup();
    let req = request(Action::InstallCustomApps, &["a1"]).apps_for("a1", apps(&["vim", "git"]));

    let created = ctx.engine.create_operation(req).await.unwrap();
    let id = &created.operation.id;
    assert_eq!(created.operation.plugin, Plugin::Patching);

    let tracker = ctx.store.agents.get(&(id.clone(), AgentId::new("a1"))).unwrap();
    assert_eq!(tracker.apps, Some(fq_core::AppCounts::new(2)));
    assert_eq!(ctx.store.apps_of(id, &AgentId::new("a1")).len(), 2);

    let entry = &ctx.engine.queue(&AgentId::new("a1"))[0];
    assert_eq!(entry.payload["apps"][0]["app_id"], "vim");
    assert_eq!(entry.payload["apps"][1]["app_id"], "git");
}

#[tokio::test]
async fn duplicate_app_ids_are_rejected_before_anything_is_written() {
    let ctx = setup();
    let req = request(Action::InstallOsApps, &["a1", "a2"])
        .apps_for("a1", apps(&["vim", "vim"]))
        .apps_for("a2", apps(&["git"]));

    let err = ctx.engine.create_operation(req).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::DuplicateApp { agent_id: AgentId::new("a1"), app_id: AppId::new("vim") }
    );
    assert!(ctx.store.operations.is_empty());
    assert!(ctx.store.agents.is_empty());
    assert!(ctx.store.apps.is_empty());
    assert!(ctx.engine.queue(&AgentId::new("a2")).is_empty());
}

#[tokio::test]
async fn target_that_fails_to_schedule_is_failed_in_place() {
    let ctx = setup();
    let req = request(Action::InstallOsApps, &["a1", "a2"])
        .apps_for("a1", apps(&["vim", "git"]))
        .apps_for("a2", apps(&["git"]));
    let operation = Operation::builder()
        .id(OperationId::from_string("op-fan"))
        .action(Action::InstallOsApps)
        .plugin(Plugin::Patching)
        .agents(AgentCounts::new(2))
        .build();
    let id = operation.id.clone();
    ctx.store.operations.insert(id.clone(), operation.clone()).unwrap();
    // An existing row makes a1's second app insert collide
    let stale = OperationPerApp::builder().operation_id(id.clone()).agent_id("a1").app_id("git").build();
    ctx.store.apps.insert(app_key(&stale), stale).unwrap();

    let ttl = QueueTtl::compute(NOW, 10, 10, None);
    let mut failures = Vec::new();
    let targets = vec![AgentId::new("a1"), AgentId::new("a2")];
    let scheduled = ctx.engine.fan_out(&operation, targets, &req, ttl, NOW, &mut failures).unwrap();

    assert_eq!(scheduled, vec![AgentId::new("a2")]);
    assert_eq!(
        failures,
        vec![TargetFailure {
            agent_id: AgentId::new("a1"),
            error: EngineError::FailedToCreateOperation(id.clone()),
        }]
    );
    let tracker = ctx.store.agents.get(&(id.clone(), AgentId::new("a1"))).unwrap();
    assert_eq!(tracker.status, AgentOperationStatus::Failed);
    assert!(tracker.errors.is_some());
    assert!(ctx.engine.queue(&AgentId::new("a1")).is_empty());
    assert_eq!(ctx.engine.queue(&AgentId::new("a2")).len(), 1);

    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!(op.agents.failed, 1);
    assert_eq!(op.agents.pending_pickup, 1);
    assert!(op.agents.is_balanced());
    assert_eq!(op.status, OperationStatus::ResultsIncomplete);

    // Reports against the rows a1 got before the failure change nothing
    let receipt = ctx.engine.report_app_result(app_result(&id, "a1", "vim", "true")).await.unwrap();
    assert!(receipt.duplicate);
    assert_eq!(receipt.agent_status, AgentOperationStatus::Failed);
    assert_eq!(ctx.store.operations.get(&id).unwrap(), op);

    let receipt = ctx.engine.report_app_result(app_result(&id, "a2", "git", "true")).await.unwrap();
    assert!(!receipt.duplicate);
    assert_eq!(receipt.operation_status, OperationStatus::ResultsCompletedWithErrors);
    let op = ctx.store.operations.get(&id).unwrap();
    assert_eq!((op.agents.completed, op.agents.failed), (1, 1));
    assert!(op.agents.is_balanced());
}

#[tokio::test]
async fn failing_a_target_twice_counts_once() {
    let ctx = setup();
    let id = ctx.create(request(Action::Reboot, &["a1", "a2"])).await;
    let error = EngineError::FailedToCreateOperation(id.clone());

    ctx.engine.fail_target(&id, &AgentId::new("a1"), &error, NOW).unwrap();
    let after_first = ctx.store.operations.get(&id).unwrap();
    ctx.engine.fail_target(&id, &AgentId::new("a1"), &error, NOW).unwrap();

    assert_eq!(ctx.store.operations.get(&id).unwrap(), after_first);
    assert_eq!(after_first.agents.failed, 1);
    assert_eq!(after_first.agents.pending_pickup, 1);
    assert!(ctx.engine.queue(&AgentId::new("a1")).is_empty());
}

#[tokio::test]
async fn server_ttl_override_and_agent_deadline() {
    let ctx = setup();
    let later = NOW + 60 * TEN_MINUTES;
    let req = request(Action::Reboot, &["a1"]).server_ttl_minutes(30u64).agent_deadline_ms(later);
    ctx.engine.create_operation(req).await.unwrap();
    let entry = &ctx.engine.queue(&AgentId::new("a1"))[0];
    assert_eq!(entry.ttl.server_queue_ttl_ms, NOW + 3 * TEN_MINUTES);
    assert_eq!(entry.ttl.agent_queue_ttl_ms, later);

    // An agent deadline before the server deadline is ignored
    let req = request(Action::Reboot, &["a2"]).agent_deadline_ms(NOW + 1);
    ctx.engine.create_operation(req).await.unwrap();
    let entry = &ctx.engine.queue(&AgentId::new("a2"))[0];
    assert_eq!(entry.ttl.agent_queue_ttl_ms, NOW + 2 * TEN_MINUTES);
}

#[tokio::test]
async fn view_ttls_apply_to_entries() {
    let ctx = setup();
    let mut req = request(Action::Reboot, &["a1"]);
    req.view_name = "short".to_string();
    ctx.engine.create_operation(req).await.unwrap();

    let entry = &ctx.engine.queue(&AgentId::new("a1"))[0];
    assert_eq!(entry.view_name, "short");
    assert_eq!(entry.ttl.server_queue_ttl_ms, NOW + 60_000);
    assert_eq!(entry.ttl.agent_queue_ttl_ms, NOW + 120_000);
}

#[tokio::test]
async fn order_ids_increase_across_operations() {
    let ctx = setup();
    for _ in 0..3 {
        ctx.create(request(Action::Reboot, &["a1"])).await;
    }
    let orders: Vec<_> = ctx.engine.queue(&AgentId::new("a1")).iter().map(|e| e.order_id).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[parameterized(
    object = { json!({"reason": "patch"}), json!({"reason": "patch"}) },
    null = { Value::Null, json!({}) },
    scalar = { json!("hello"), json!({"data": "hello"}) },
    array = { json!([1, 2]), json!({"data": [1, 2]}) },
)]
fn payload_shapes(payload: Value, expected: Value) {
    assert_eq!(instruction_payload(&payload, None, None), expected);
}

#[test]
fn payload_carries_apps_and_throttle() {
    let throttle = Throttle {
        cpu_throttle: CpuThrottle::Idle,
        net_throttle: 256,
        restart: RestartPolicy::Needed,
    };
    let apps = apps(&["vim"]);
    let body = instruction_payload(&json!({"note": "x"}), Some(&apps), Some(throttle));
    assert_eq!(
        body,
        json!({
            "note": "x",
            "apps": [{"app_id": "vim", "app_name": "vim-name", "app_version": "1.0"}],
            "cpu_throttle": "idle",
            "net_throttle": 256,
            "restart": "needed",
        })
    );
}
