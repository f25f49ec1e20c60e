// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat tracker: reads liveness beacons and sweeps expired workers.

use crate::ctx::ServerCtx;
use dird_core::consts::EXPIRY_SWEEP_INTERVAL;
use dird_core::Identity;
use dird_driver::DriverError;
use std::collections::HashSet;
use std::sync::Arc;

/// Dedicated reader for the heartbeat channel.
///
/// Loss is tolerated by design: a missed beat just brings the worker
/// closer to its expiry deadline.
pub async fn heartbeat_task(ctx: Arc<ServerCtx>) {
    loop {
        match ctx.driver.heartbeat_recv().await {
            Ok((identity, beat)) => {
                tracing::debug!(%identity, version = %beat.version, "heartbeat");
                ctx.tables.observe_heartbeat(identity, beat, ctx.now_ms());
                // A worker (re)appearing may unblock targeting
                ctx.dispatch_wake.notify_one();
            }
            Err(DriverError::Closed) => {
                tracing::debug!("heartbeat channel closed");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "heartbeat receive error");
            }
        }
    }
}

/// Once-per-second sweep that logs workers crossing their expiry
/// deadline. Expired identities stop being dispatch candidates but stay
/// in the table for display until an explicit purge.
pub async fn expiry_sweep_task(ctx: Arc<ServerCtx>) {
    let mut interval = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut previously_alive: HashSet<Identity> = HashSet::new();

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            () = ctx.shutdown.notified() => return,
        }

        let now_ms = ctx.now_ms();
        let alive: HashSet<Identity> = ctx.tables.alive_identities(now_ms).into_iter().collect();
        for identity in previously_alive.difference(&alive) {
            tracing::warn!(%identity, "worker expired");
        }
        if alive != previously_alive {
            // Timeout accounting may change when the live set shrinks
            ctx.dispatch_wake.notify_one();
        }
        previously_alive = alive;
    }
}
