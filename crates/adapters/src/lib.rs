// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fq-adapters: Interfaces to the services fleetq consumes but does not own

pub mod directory;
pub mod inventory;
pub mod views;

pub use directory::{DirectoryError, StaticDirectory, TargetDirectory};
pub use inventory::{InventoryAdapter, InventoryError, TracingInventory};
pub use views::{StaticViews, ViewSettings, ViewTtl};

#[cfg(any(test, feature = "test-support"))]
pub use directory::FakeDirectory;
#[cfg(any(test, feature = "test-support"))]
pub use inventory::{FakeInventory, InventoryCall};
