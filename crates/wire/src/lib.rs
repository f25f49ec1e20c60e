// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dird-wire: the local control-socket protocol.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.
//! The same framing carries driver frames between server and clients.

mod framing;
mod request;
mod response;
mod types;

pub use framing::{
    decode, encode, read_message, read_request, read_response, write_message, write_request,
    write_response, ProtocolError,
};
pub use request::Request;
pub use response::Response;
pub use types::{JobDetail, JobSummary, NodeEntry};
