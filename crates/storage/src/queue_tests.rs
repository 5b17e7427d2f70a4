// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fq_core::{Action, Plugin, QueueTtl};
use proptest::prelude::*;

const NOW: u64 = 1_000_000;

fn entry(agent: &str, op: &OperationId, server_minutes: u64) -> QueueEntry {
    QueueEntry::new(
        AgentId::new(agent),
        "global",
        op.clone(),
        Action::Reboot,
        Plugin::Core,
        serde_json::Value::Null,
        QueueTtl::compute(NOW, server_minutes, 10, None),
        NOW,
    )
}

#[test]
fn enqueue_assigns_increasing_order_per_agent() {
    let store = QueueStore::new();
    let op = OperationId::new();
    assert_eq!(store.enqueue(entry("a", &op, 10)), 1);
    assert_eq!(store.enqueue(entry("b", &op, 10)), 1);
    assert_eq!(store.enqueue(entry("a", &op, 10)), 2);
    assert_eq!(store.len(), 3);
}

#[test]
fn order_ids_are_not_reused_after_drain() {
    let store = QueueStore::new();
    let op = OperationId::new();
    store.enqueue(entry("a", &op, 10));
    store.enqueue(entry("a", &op, 10));
    assert_eq!(store.pop_all(&AgentId::new("a")).len(), 2);
    assert_eq!(store.enqueue(entry("a", &op, 10)), 3);
}

#[test]
fn pop_all_returns_only_that_agents_entries_in_order() {
    let store = QueueStore::new();
    let (op1, op2) = (OperationId::new(), OperationId::new());
    store.enqueue(entry("a", &op1, 10));
    store.enqueue(entry("b", &op1, 10));
    store.enqueue(entry("a", &op2, 10));

    let popped = store.pop_all(&AgentId::new("a"));
    let ops: Vec<_> = popped.iter().map(|e| (e.order_id, e.operation_id.clone())).collect();
    assert_eq!(ops, vec![(1, op1), (2, op2)]);
    assert!(store.list(&AgentId::new("a")).is_empty());
    assert_eq!(store.list(&AgentId::new("b")).len(), 1);
    assert!(store.pop_all(&AgentId::new("a")).is_empty());
}

#[test]
fn lease_hides_entries_until_visibility_elapses() {
    let store = QueueStore::new();
    let agent = AgentId::new("a");
    store.enqueue(entry("a", &OperationId::new(), 10));

    let first = store.lease_all(&agent, NOW, 1_000);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].leased_until_ms, Some(NOW + 1_000));
    assert!(store.lease_all(&agent, NOW + 500, 1_000).is_empty());

    let again = store.lease_all(&agent, NOW + 1_000, 1_000);
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].id, first[0].id);
}

#[test]
fn ack_removes_only_named_entries_of_that_agent() {
    let store = QueueStore::new();
    let op = OperationId::new();
    store.enqueue(entry("a", &op, 10));
    store.enqueue(entry("a", &op, 10));
    store.enqueue(entry("b", &op, 10));
    let a = store.list(&AgentId::new("a"));
    let b = store.list(&AgentId::new("b"));

    let removed = store.ack(&AgentId::new("a"), &[a[0].id.clone(), b[0].id.clone()]);
    assert_eq!(removed.len(), 1);
    assert_eq!(store.list(&AgentId::new("a")).len(), 1);
    assert_eq!(store.list(&AgentId::new("b")).len(), 1);
}

#[test]
fn remove_is_idempotent() {
    let store = QueueStore::new();
    store.enqueue(entry("a", &OperationId::new(), 10));
    let id = store.list(&AgentId::new("a"))[0].id.clone();
    assert!(store.remove(&id).is_some());
    assert!(store.remove(&id).is_none());
    assert!(store.is_empty());
}

#[test]
fn remove_for_operation_leaves_other_operations() {
    let store = QueueStore::new();
    let (op1, op2) = (OperationId::new(), OperationId::new());
    store.enqueue(entry("a", &op1, 10));
    store.enqueue(entry("a", &op2, 10));
    assert_eq!(store.remove_for_operation(&AgentId::new("a"), &op1).len(), 1);
    let left = store.list(&AgentId::new("a"));
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].operation_id, op2);
}

#[test]
fn expired_selects_by_server_deadline_without_removing() {
    let store = QueueStore::new();
    let op = OperationId::new();
    store.enqueue(entry("a", &op, 1));
    store.enqueue(entry("b", &op, 5));

    assert!(store.expired(NOW + 59_999).is_empty());
    let due = store.expired(NOW + 60_000);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].agent_id, "a");
    assert_eq!(store.len(), 2);
    assert_eq!(store.expired(NOW + 300_000).len(), 2);
}

#[test]
fn state_round_trip_preserves_high_water() {
    let store = QueueStore::new();
    let op = OperationId::new();
    store.enqueue(entry("a", &op, 10));
    store.enqueue(entry("a", &op, 10));
    store.pop_all(&AgentId::new("a"));
    store.enqueue(entry("b", &op, 10));

    let restored = QueueStore::from_state(store.to_state());
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.enqueue(entry("a", &op, 10)), 3);
    assert_eq!(restored.enqueue(entry("b", &op, 10)), 2);
}

proptest! {
    #[test]
    fn order_ids_strictly_increase_in_insertion_order(
        agents in proptest::collection::vec(0u8..4, 1..40),
        pops in proptest::collection::vec(any::<bool>(), 1..40),
    ) {
        let store = QueueStore::new();
        let op = OperationId::new();
        let mut last: HashMap<u8, u64> = HashMap::new();
        for (i, agent) in agents.iter().enumerate() {
            let name = format!("agent-{agent}");
            let order = store.enqueue(entry(&name, &op, 10));
            if let Some(prev) = last.get(agent) {
                prop_assert!(order > *prev);
            }
            last.insert(*agent, order);
            if pops.get(i).copied().unwrap_or(false) {
                store.pop_all(&AgentId::new(name));
            }
        }
    }
}
