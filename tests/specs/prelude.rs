// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared imports and assertions for specs.

pub use std::time::Duration;

pub use fq_core::{
    Action, AgentId, AgentOperationStatus, AppId, OperationId, OperationStatus, QueueEntry,
};
pub use fq_engine::test_helpers::{app_result, apps, request, result, setup, TestContext};

/// Server queue TTL of the `global` view
pub const SERVER_TTL: Duration = Duration::from_secs(10 * 60);

/// Every operation's counters add up to its total.
pub fn assert_all_balanced(ctx: &TestContext) {
    for op in ctx.store.operations.values() {
        assert!(op.agents.is_balanced(), "unbalanced counters on {}: {:?}", op.id, op.agents);
    }
}

pub fn agent(id: &str) -> AgentId {
    AgentId::new(id)
}

/// Current-thread runtime for driving the async engine from proptest bodies.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}
