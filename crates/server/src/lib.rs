// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dird-server: the job coordinator.
//!
//! One dedicated task per role: heartbeat reader, expiry sweep,
//! dispatcher, return reader, transfer server, local socket listener.
//! Tasks share state through [`ctx::ServerCtx`] and wake each other
//! over typed queues.

mod ctx;
mod dispatch;
mod heartbeat;
mod lifecycle;
mod listener;
mod returns;
mod tables;
#[cfg(test)]
pub(crate) mod test_helpers;
mod transfer;

pub use ctx::ServerCtx;
pub use lifecycle::{Server, ServerConfig};
pub use tables::Tables;

use thiserror::Error;

/// Fatal coordinator errors; everything recoverable is logged and
/// retried in place.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("datastore error: {0}")]
    Store(#[from] dird_store::StoreError),

    #[error("driver error: {0}")]
    Driver(#[from] dird_driver::DriverError),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] dird_wire::ProtocolError),
}
