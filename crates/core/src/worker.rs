// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker records and heartbeat payloads.

use crate::consts::{HEARTBEAT_INTERVAL_SECS, HEARTBEAT_LIVENESS};
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Payload a client sends on the heartbeat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub version: String,
    #[serde(default)]
    pub host_uptime_secs: u64,
    #[serde(default)]
    pub agent_uptime_secs: u64,
    /// Verbs this client can execute (capability advertisement)
    #[serde(default)]
    pub components: Vec<String>,
}

/// Server-side record of a known client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub identity: Identity,
    pub last_seen_ms: u64,
    /// Deadline after which the worker stops being a dispatch candidate
    pub expiry_ms: u64,
    pub version: String,
    #[serde(default)]
    pub host_uptime_secs: u64,
    #[serde(default)]
    pub agent_uptime_secs: u64,
    #[serde(default)]
    pub components: Vec<String>,
}

impl WorkerRecord {
    /// Create a record from a first heartbeat.
    pub fn from_heartbeat(identity: Identity, beat: Heartbeat, now_ms: u64) -> Self {
        let mut record = Self {
            identity,
            last_seen_ms: now_ms,
            expiry_ms: 0,
            version: beat.version.clone(),
            host_uptime_secs: beat.host_uptime_secs,
            agent_uptime_secs: beat.agent_uptime_secs,
            components: beat.components.clone(),
        };
        record.observe(beat, now_ms);
        record
    }

    /// Refresh the record from a heartbeat, pushing the expiry deadline out.
    pub fn observe(&mut self, beat: Heartbeat, now_ms: u64) {
        self.last_seen_ms = now_ms;
        self.expiry_ms = now_ms + HEARTBEAT_INTERVAL_SECS * HEARTBEAT_LIVENESS * 1_000;
        self.version = beat.version;
        self.host_uptime_secs = beat.host_uptime_secs;
        self.agent_uptime_secs = beat.agent_uptime_secs;
        self.components = beat.components;
    }

    /// A worker is alive iff now is before its expiry deadline.
    pub fn is_alive(&self, now_ms: u64) -> bool {
        now_ms < self.expiry_ms
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
