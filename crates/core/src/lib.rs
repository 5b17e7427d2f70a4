// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fq-core: Domain types and pure state machines for the fleetq dispatch queue

pub mod macros;

pub mod action;
pub mod clock;
pub mod id;
pub mod operation;
pub mod queue;
pub mod search;
pub mod tracker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use action::{Action, CpuThrottle, PerformedOn, Plugin, RequestMethod, RestartPolicy, Throttle};
pub use clock::{minutes_to_ms, Clock, FakeClock, SystemClock};
pub use id::{short, AgentId, AppId, OperationId, QueueEntryId, TagId};
#[cfg(any(test, feature = "test-support"))]
pub use operation::OperationBuilder;
pub use operation::{AgentCounts, AgentOutcome, Operation, OperationStatus, PendingStage, Rollup};
pub use queue::{QueueEntry, QueueTtl};
pub use search::{OperationFilter, SortKey, SortOrder, DEFAULT_PAGE_SIZE};
#[cfg(any(test, feature = "test-support"))]
pub use tracker::{OperationPerAgentBuilder, OperationPerAppBuilder};
pub use tracker::{
    parse_success, AgentOperationStatus, AppCounts, AppReport, AppResults, AppSpec,
    OperationPerAgent, OperationPerApp, Package, EXPIRED_ERROR,
};
