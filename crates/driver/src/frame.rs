// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frames and channels: what travels between server and clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical channels with independent in-flight queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Best-effort, lossy liveness beacons
    Heartbeat,
    /// Job dispatch, server → client
    Job,
    /// Bulk bytes (file content for ADD/COPY)
    Transfer,
    /// Results, client → server; at-least-once
    Return,
}

impl Channel {
    pub const ALL: [Channel; 4] =
        [Channel::Heartbeat, Channel::Job, Channel::Transfer, Channel::Return];

    pub(crate) fn index(self) -> usize {
        match self {
            Channel::Heartbeat => 0,
            Channel::Job => 1,
            Channel::Transfer => 2,
            Channel::Return => 3,
        }
    }
}

dird_core::simple_display! {
    Channel {
        Heartbeat => "heartbeat",
        Job => "job",
        Transfer => "transfer",
        Return => "return",
    }
}

/// Delivery control bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    /// Positive acknowledgement
    #[serde(default)]
    pub ack: bool,
    /// Delivery given up after retry exhaustion
    #[serde(default)]
    pub nack: bool,
    /// Final frame of a multi-frame exchange
    #[serde(default)]
    pub end: bool,
}

/// One message on a channel.
///
/// Serialization must be stable across versions: every field has a
/// default so old peers tolerate new fields being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub message_id: String,
    #[serde(default)]
    pub control: ControlFlags,
    /// What the receiver should do with the frame (verb or internal op)
    pub command: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub stdout: String,
    /// Client identity the frame concerns
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub job_sha: String,
}

impl Frame {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            control: ControlFlags::default(),
            command: command.into(),
            data: Value::Null,
            info: String::new(),
            stderr: String::new(),
            stdout: String::new(),
            identity: String::new(),
            job_sha: String::new(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_job_sha(mut self, job_sha: impl Into<String>) -> Self {
        self.job_sha = job_sha.into();
        self
    }

    pub fn nacked(mut self) -> Self {
        self.control.nack = true;
        self
    }
}

/// Frame plus its channel, for transports that multiplex one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Envelope {
    pub channel: Channel,
    pub frame: Frame,
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
