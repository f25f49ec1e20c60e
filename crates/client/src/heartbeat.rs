// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat emitter: periodic liveness beacons with jitter.

use dird_core::{Heartbeat, Identity};
use dird_driver::Driver;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Emit a heartbeat every interval, jittered ±10% so a fleet restarted
/// together does not beat in lockstep.
pub async fn heartbeat_task(
    driver: Arc<dyn Driver>,
    identity: Identity,
    components: Vec<String>,
    interval: Duration,
) {
    let started = Instant::now();
    loop {
        let beat = Heartbeat {
            version: env!("CARGO_PKG_VERSION").to_string(),
            host_uptime_secs: host_uptime_secs(),
            agent_uptime_secs: started.elapsed().as_secs(),
            components: components.clone(),
        };
        // Heartbeats are lossy by contract; a failed send just waits
        // for the next interval
        if let Err(e) = driver.heartbeat_send(&identity, &beat).await {
            tracing::debug!(error = %e, "heartbeat send failed");
        }

        tokio::time::sleep(jittered(interval)).await;
    }
}

fn jittered(interval: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.9..=1.1);
    interval.mul_f64(factor)
}

/// Host uptime from /proc/uptime; zero where unreadable.
fn host_uptime_secs() -> u64 {
    std::fs::read_to_string("/proc/uptime")
        .ok()
        .and_then(|text| text.split_whitespace().next().and_then(|s| s.parse::<f64>().ok()))
        .map_or(0, |secs| secs as u64)
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
