// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application inventory side effects of operations.

use async_trait::async_trait;
use fq_core::{Action, AgentId, AppId, Package};
use thiserror::Error;

/// Errors from inventory operations
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}

/// Adapter for the application inventory store
#[async_trait]
pub trait InventoryAdapter: Clone + Send + Sync + 'static {
    /// Undo the pending status of an app whose operation expired
    async fn revert_app(
        &self,
        agent_id: &AgentId,
        app_id: &AppId,
        action: Action,
    ) -> Result<(), InventoryError>;

    /// Record packages an agent installed or removed as a side effect
    async fn record_app_changes(
        &self,
        agent_id: &AgentId,
        added: &[Package],
        removed: &[Package],
    ) -> Result<(), InventoryError>;
}

/// Inventory adapter that only logs; used when no inventory store is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingInventory;

#[async_trait]
impl InventoryAdapter for TracingInventory {
    async fn revert_app(
        &self,
        agent_id: &AgentId,
        app_id: &AppId,
        action: Action,
    ) -> Result<(), InventoryError> {
        tracing::info!(%agent_id, %app_id, %action, "reverting app status");
        Ok(())
    }

    async fn record_app_changes(
        &self,
        agent_id: &AgentId,
        added: &[Package],
        removed: &[Package],
    ) -> Result<(), InventoryError> {
        tracing::info!(%agent_id, added = added.len(), removed = removed.len(), "app changes");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{InventoryAdapter, InventoryError};
    use async_trait::async_trait;
    use fq_core::{Action, AgentId, AppId, Package};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded inventory call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum InventoryCall {
        Revert { agent_id: AgentId, app_id: AppId, action: Action },
        Changes { agent_id: AgentId, added: Vec<Package>, removed: Vec<Package> },
    }

    #[derive(Default)]
    struct FakeInventoryState {
        calls: Vec<InventoryCall>,
        failing: bool,
    }

    /// Fake inventory adapter for testing
    #[derive(Clone, Default)]
    pub struct FakeInventory {
        inner: Arc<Mutex<FakeInventoryState>>,
    }

    impl FakeInventory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<InventoryCall> {
            self.inner.lock().calls.clone()
        }

        /// Make every call fail (still recorded)
        pub fn set_failing(&self, failing: bool) {
            self.inner.lock().failing = failing;
        }

        fn record(&self, call: InventoryCall) -> Result<(), InventoryError> {
            let mut inner = self.inner.lock();
            inner.calls.push(call);
            if inner.failing {
                return Err(InventoryError::Unavailable("fake".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl InventoryAdapter for FakeInventory {
        async fn revert_app(
            &self,
            agent_id: &AgentId,
            app_id: &AppId,
            action: Action,
        ) -> Result<(), InventoryError> {
            self.record(InventoryCall::Revert {
                agent_id: agent_id.clone(),
                app_id: app_id.clone(),
                action,
            })
        }

        async fn record_app_changes(
            &self,
            agent_id: &AgentId,
            added: &[Package],
            removed: &[Package],
        ) -> Result<(), InventoryError> {
            self.record(InventoryCall::Changes {
                agent_id: agent_id.clone(),
                added: added.to_vec(),
                removed: removed.to_vec(),
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeInventory, InventoryCall};
