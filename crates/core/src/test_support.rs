// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{AgentId, AppId, AppSpec};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::operation::{AgentOutcome, PendingStage, Rollup};
    use crate::tracker::AppResults;
    use proptest::prelude::*;

    pub fn arb_outcome() -> impl Strategy<Value = AgentOutcome> {
        prop_oneof![
            Just(AgentOutcome::Completed),
            Just(AgentOutcome::CompletedWithErrors),
            Just(AgentOutcome::Failed),
            Just(AgentOutcome::Expired),
        ]
    }

    pub fn arb_rollup() -> impl Strategy<Value = Rollup> {
        let stage = prop_oneof![Just(PendingStage::Pickup), Just(PendingStage::Results)];
        prop_oneof![
            Just(Rollup::PickedUp),
            (stage, arb_outcome()).prop_map(|(from, outcome)| Rollup::Finished { from, outcome }),
        ]
    }

    pub fn arb_app_results() -> impl Strategy<Value = AppResults> {
        prop_oneof![
            Just(AppResults::Pending),
            Just(AppResults::Received),
            Just(AppResults::ReceivedWithErrors),
        ]
    }

    /// What an agent does next in a randomized lifecycle run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AgentStep {
        Checkin,
        Report { success: bool },
        Expire,
    }

    pub fn arb_agent_step() -> impl Strategy<Value = AgentStep> {
        prop_oneof![
            Just(AgentStep::Checkin),
            any::<bool>().prop_map(|success| AgentStep::Report { success }),
            Just(AgentStep::Expire),
        ]
    }
}

// ── Factories ───────────────────────────────────────────────────────────

/// Agent ids `agent-0`, `agent-1`, ...
pub fn agent_ids(n: usize) -> Vec<AgentId> {
    (0..n).map(|i| AgentId::new(format!("agent-{i}"))).collect()
}

/// App specs `app-0`, `app-1`, ... with matching names.
pub fn app_specs(n: usize) -> Vec<AppSpec> {
    (0..n)
        .map(|i| AppSpec {
            app_id: AppId::new(format!("app-{i}")),
            app_name: format!("package-{i}"),
            app_version: "1.0".to_string(),
        })
        .collect()
}
