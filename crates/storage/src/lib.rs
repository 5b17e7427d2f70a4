// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fq-storage: Tables, pull queues, and snapshots for fleetq

mod queue;
mod snapshot;
mod store;
mod table;

pub use queue::{QueueState, QueueStore};
pub use snapshot::{load_snapshot, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use store::{agent_key, app_key, AgentKey, AppKey, Store, StoreState};
pub use table::{CasOutcome, DuplicateKey, Table, Versioned, WriteOutcome};
