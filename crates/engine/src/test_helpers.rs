// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

#![allow(clippy::panic)]

use std::sync::Arc;

use fq_adapters::{FakeDirectory, FakeInventory, StaticViews, ViewTtl};
use fq_core::{Action, AgentId, AppId, AppSpec, FakeClock, OperationId, QueueEntry};
use fq_storage::Store;

use crate::dispatch::CreateOperation;
use crate::engine::{Engine, EngineConfig, EngineDeps};
use crate::report::{AppResultReport, ResultReport};

/// Convenience alias for the fully-typed test engine.
pub type TestEngine = Engine<FakeDirectory, StaticViews, FakeInventory, FakeClock>;

/// Test context holding the engine and handles to its fakes.
pub struct TestContext {
    pub engine: TestEngine,
    pub clock: FakeClock,
    pub directory: FakeDirectory,
    pub inventory: FakeInventory,
    pub store: Arc<Store>,
}

/// Engine over fresh fakes. The `global` view uses 10/10 minute TTLs.
pub fn setup() -> TestContext {
    setup_with(EngineConfig::default())
}

pub fn setup_with(config: EngineConfig) -> TestContext {
    let clock = FakeClock::new();
    let directory = FakeDirectory::new();
    let inventory = FakeInventory::new();
    let store = Arc::new(Store::new());
    let views = StaticViews::new([("short".to_string(), ViewTtl {
        server_queue_ttl_minutes: 1,
        agent_queue_ttl_minutes: 1,
    })]);
    let engine = Engine::new(
        EngineDeps {
            directory: directory.clone(),
            views,
            inventory: inventory.clone(),
            store: Arc::clone(&store),
        },
        clock.clone(),
        config,
    );
    TestContext { engine, clock, directory, inventory, store }
}

/// A request for `action` on the listed agents in the `global` view.
pub fn request(action: Action, agents: &[&str]) -> CreateOperation {
    CreateOperation::new(action, "global")
        .created_by("admin")
        .agent_ids(agents.iter().map(|a| AgentId::new(*a)).collect())
}

/// App specs named after their ids.
pub fn apps(ids: &[&str]) -> Vec<AppSpec> {
    ids.iter()
        .map(|id| AppSpec {
            app_id: AppId::new(*id),
            app_name: format!("{id}-name"),
            app_version: "1.0".to_string(),
        })
        .collect()
}

pub fn result(operation_id: &OperationId, agent: &str, success: &str) -> ResultReport {
    ResultReport {
        operation_id: operation_id.clone(),
        agent_id: AgentId::new(agent),
        success: success.to_string(),
        error: (success == "false").then(|| "failed".to_string()),
        status_code: None,
    }
}

pub fn app_result(
    operation_id: &OperationId,
    agent: &str,
    app: &str,
    success: &str,
) -> AppResultReport {
    AppResultReport {
        operation_id: operation_id.clone(),
        agent_id: AgentId::new(agent),
        app_id: AppId::new(app),
        success: success.to_string(),
        error: (success == "false").then(|| "install failed".to_string()),
        status_code: None,
        apps_to_add: Vec::new(),
        apps_to_delete: Vec::new(),
        reboot_required: false,
    }
}

impl TestContext {
    /// Check in and return the delivered entries, failing the test on error.
    pub async fn checkin(&self, agent: &str) -> Vec<QueueEntry> {
        match self.engine.checkin(&AgentId::new(agent)).await {
            Ok(entries) => entries,
            Err(e) => panic!("check-in for {agent} failed: {e}"),
        }
    }

    /// Create an operation, failing the test on error.
    pub async fn create(&self, req: CreateOperation) -> OperationId {
        match self.engine.create_operation(req).await {
            Ok(created) => created.operation.id,
            Err(e) => panic!("create failed: {e}"),
        }
    }
}
