// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fq-engine: Operation dispatch, agent check-in, result rollup, and expiry

mod checkin;
mod dispatch;
mod engine;
mod error;
mod ledger;
mod report;
mod sweeper;

#[cfg(any(test, feature = "test-support"))]
pub mod test_helpers;

pub use dispatch::{CreateOperation, Created};
pub use engine::{Engine, EngineConfig, EngineDeps, OperationDetail, OperationPage};
pub use error::{EngineError, TargetFailure};
pub use report::{AppResultReport, ResultReceipt, ResultReport};
pub use sweeper::{run_sweeper, SweepReport};
