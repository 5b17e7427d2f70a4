// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral specs for the operation queue, run against the engine over
//! in-memory storage and fake collaborators.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/concurrency.rs"]
mod concurrency;
#[path = "specs/invariants.rs"]
mod invariants;
#[path = "specs/lifecycle.rs"]
mod lifecycle;
