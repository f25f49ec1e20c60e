// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dird-driver: pluggable transports between server and clients.
//!
//! A driver is a symmetric, connection-like channel per identified
//! client. Within one `(identity, channel)` pair order is preserved;
//! nothing is promised across identities. The `return` channel is
//! at-least-once; heartbeats are best-effort and lossy.

mod frame;
mod inproc;
mod retry;
mod tcp;

pub use frame::{Channel, ControlFlags, Frame};
pub use inproc::InprocHub;
pub use retry::{backoff_delay, send_with_retry};
pub use tcp::{TcpClientDriver, TcpServerDriver};

use dird_core::{Heartbeat, Identity};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("channel closed")]
    Closed,

    #[error("receive timed out")]
    Timeout,

    #[error("frame undeliverable after {attempts} attempts")]
    Undeliverable { attempts: u32 },

    #[error("unsupported by this driver: {0}")]
    Unsupported(String),

    #[error("codec error: {0}")]
    Codec(#[from] dird_wire::ProtocolError),
}

/// The transport contract both sides speak.
///
/// On the server, `identity` addresses a client; on a client it is the
/// client's own identity (its frames route back to the server).
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    async fn send(
        &self,
        channel: Channel,
        identity: &Identity,
        frame: Frame,
    ) -> Result<(), DriverError>;

    async fn recv(&self, channel: Channel) -> Result<(Identity, Frame), DriverError>;

    async fn recv_timeout(
        &self,
        channel: Channel,
        timeout: Duration,
    ) -> Result<(Identity, Frame), DriverError> {
        tokio::time::timeout(timeout, self.recv(channel))
            .await
            .map_err(|_| DriverError::Timeout)?
    }

    /// Emit a liveness beacon on the heartbeat channel.
    async fn heartbeat_send(
        &self,
        identity: &Identity,
        beat: &Heartbeat,
    ) -> Result<(), DriverError> {
        let data =
            serde_json::to_value(beat).map_err(|e| DriverError::Transport(e.to_string()))?;
        let frame = Frame::new("heartbeat").with_identity(identity.as_str()).with_data(data);
        self.send(Channel::Heartbeat, identity, frame).await
    }

    /// Receive and decode one liveness beacon.
    async fn heartbeat_recv(&self) -> Result<(Identity, Heartbeat), DriverError> {
        let (identity, frame) = self.recv(Channel::Heartbeat).await?;
        let beat = serde_json::from_value(frame.data)
            .map_err(|e| DriverError::Transport(format!("malformed heartbeat: {e}")))?;
        Ok((identity, beat))
    }
}

/// Transport selection and addressing, from configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Transport plug-in name: `tcp` or `inproc`
    pub driver: String,
    /// Server listen address (server side)
    pub bind_address: String,
    /// Server address to connect to (client side)
    pub server_address: String,
    /// This client's identity (client side)
    pub identity: Identity,
    /// Plain-text authentication token, where the driver supports it
    pub shared_key: Option<String>,
    /// Asymmetric-key wire encryption; not offered by the reference drivers
    pub curve_encryption: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            driver: "tcp".to_string(),
            bind_address: "0.0.0.0:5555".to_string(),
            server_address: "127.0.0.1:5555".to_string(),
            identity: Identity::local(),
            shared_key: None,
            curve_encryption: false,
        }
    }
}

fn check_curve(config: &DriverConfig) -> Result<(), DriverError> {
    if config.curve_encryption {
        return Err(DriverError::Unsupported(format!(
            "driver {} does not implement curve_encryption",
            config.driver
        )));
    }
    Ok(())
}

/// Bind the server side of the configured transport.
pub async fn bind(config: &DriverConfig) -> Result<Arc<dyn Driver>, DriverError> {
    check_curve(config)?;
    match config.driver.as_str() {
        "tcp" => Ok(Arc::new(TcpServerDriver::bind(config).await?)),
        "inproc" => inproc::bind_named(&config.bind_address),
        other => Err(DriverError::Unsupported(format!("unknown driver: {other}"))),
    }
}

/// Connect the client side of the configured transport.
pub async fn connect(config: &DriverConfig) -> Result<Arc<dyn Driver>, DriverError> {
    check_curve(config)?;
    match config.driver.as_str() {
        "tcp" => Ok(Arc::new(TcpClientDriver::connect(config).await?)),
        "inproc" => inproc::connect_named(&config.server_address, &config.identity),
        other => Err(DriverError::Unsupported(format!("unknown driver: {other}"))),
    }
}
