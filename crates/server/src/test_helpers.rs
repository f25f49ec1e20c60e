// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for coordinator tests: an inproc hub wired to a
//! fresh context over in-memory tables and a fake clock.

use crate::ctx::ServerCtx;
use crate::tables::Tables;
use dird_components::Registry;
use dird_core::{Clock, FakeClock, Heartbeat, Identity, Job};
use dird_driver::InprocHub;
use dird_store::MemoryStore;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

pub(crate) struct TestRig {
    pub ctx: Arc<ServerCtx>,
    pub hub: Arc<InprocHub>,
    pub clock: FakeClock,
    pub submit_rx: mpsc::Receiver<Vec<Job>>,
}

pub(crate) fn rig() -> TestRig {
    let tables = Tables::load(Arc::new(MemoryStore::new())).expect("memory tables");
    let hub = InprocHub::new();
    let driver = Arc::new(hub.server().expect("inproc server"));
    let clock = FakeClock::new();
    let (submit_tx, submit_rx) = mpsc::channel(64);
    let ctx = Arc::new(ServerCtx {
        tables: Arc::new(tables),
        driver,
        clock: Arc::new(clock.clone()),
        registry: Arc::new(Registry::with_builtins()),
        submit_tx,
        dispatch_wake: Arc::new(Notify::new()),
        shutdown: Arc::new(Notify::new()),
    });
    TestRig { ctx, hub, clock, submit_rx }
}

pub(crate) fn definition(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// A job in the tables, pending dispatch.
pub(crate) fn seeded_job(rig: &TestRig, definition: Map<String, Value>, parent_async: bool) -> Job {
    let job = Job::new("RUN", definition, None, parent_async, rig.clock.epoch_ms());
    rig.ctx.tables.insert_job(job.clone());
    job
}

/// Make an identity alive in the worker table.
pub(crate) fn alive_worker(rig: &TestRig, identity: &str) {
    let beat = Heartbeat {
        version: "test".to_string(),
        host_uptime_secs: 0,
        agent_uptime_secs: 0,
        components: vec![],
    };
    rig.ctx.tables.observe_heartbeat(Identity::from(identity), beat, rig.clock.epoch_ms());
}
