// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dird-client: the worker process.
//!
//! Single-threaded cooperative by default: one ingest loop, one
//! execution loop, one heartbeat emitter. Components that opt into
//! `no_block` run on a small bounded pool without disturbing the
//! ordering of blocking jobs.

mod executor;
mod heartbeat;
mod ingest;
mod transfer;
mod worker;

pub use executor::executor_task;
pub use heartbeat::heartbeat_task;
pub use ingest::ingest_task;
pub use transfer::DriverFileSource;
pub use worker::{Worker, WorkerConfig};

use thiserror::Error;

/// Fatal worker errors; execution failures are results, not errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("datastore error: {0}")]
    Store(#[from] dird_store::StoreError),

    #[error("driver error: {0}")]
    Driver(#[from] dird_driver::DriverError),

    #[error("component error: {0}")]
    Component(#[from] dird_components::ComponentError),
}
