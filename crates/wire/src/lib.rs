// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod query;
mod request;
mod response;
mod types;
mod wire;

pub use error::{ErrorKind, ErrorPolicy, ERROR_TABLE};
pub use query::Query;
pub use request::Request;
pub use response::Response;
pub use types::{OperationDetail, TargetFailureEntry};
pub use wire::{decode, encode, read_message, write_message, ProtocolError, MAX_MESSAGE_SIZE};
pub use wire::{read_request, read_response, write_request, write_response};

/// Protocol version reported in the Hello handshake
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");
