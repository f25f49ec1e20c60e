// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP reference transport.
//!
//! One session per client identity. The client opens the connection and
//! introduces itself with a hello message (carrying the shared key when
//! configured); after that both directions carry length-prefixed JSON
//! envelopes tagging each frame with its channel.

use crate::frame::Envelope;
use crate::{Channel, Driver, DriverConfig, DriverError, Frame};
use dird_core::Identity;
use dird_wire::{decode, encode, read_message, write_message};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

const OUTBOUND_DEPTH: usize = 256;

type Routed = (Identity, Frame);

#[derive(Debug, Serialize, Deserialize)]
struct Hello {
    identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HelloAck {
    ok: bool,
    #[serde(default)]
    message: String,
}

fn transport(e: impl std::fmt::Display) -> DriverError {
    DriverError::Transport(e.to_string())
}

/// Server end: accepts client sessions and routes frames by identity.
pub struct TcpServerDriver {
    inbox: Vec<tokio::sync::Mutex<mpsc::Receiver<Routed>>>,
    conns: Arc<RwLock<HashMap<Identity, mpsc::Sender<Envelope>>>>,
    local_addr: SocketAddr,
    accept_task: tokio::task::JoinHandle<()>,
}

impl TcpServerDriver {
    pub async fn bind(config: &DriverConfig) -> Result<Self, DriverError> {
        let listener = TcpListener::bind(&config.bind_address).await.map_err(transport)?;
        let local_addr = listener.local_addr().map_err(transport)?;

        let mut inbox_tx = Vec::with_capacity(Channel::ALL.len());
        let mut inbox_rx = Vec::with_capacity(Channel::ALL.len());
        for _ in Channel::ALL {
            let (tx, rx) = mpsc::channel::<Routed>(OUTBOUND_DEPTH);
            inbox_tx.push(tx);
            inbox_rx.push(rx);
        }
        let inbox_tx = Arc::new(inbox_tx);
        let conns: Arc<RwLock<HashMap<Identity, mpsc::Sender<Envelope>>>> =
            Arc::new(RwLock::new(HashMap::new()));

        let accept_conns = Arc::clone(&conns);
        let shared_key = config.shared_key.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tracing::debug!(%addr, "client connection");
                        let conns = Arc::clone(&accept_conns);
                        let inbox_tx = Arc::clone(&inbox_tx);
                        let shared_key = shared_key.clone();
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_session(stream, conns, inbox_tx, shared_key).await
                            {
                                tracing::debug!(error = %e, "session ended");
                            }
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "accept error"),
                }
            }
        });

        tracing::info!(%local_addr, "driver listening");
        Ok(Self {
            inbox: inbox_rx.into_iter().map(tokio::sync::Mutex::new).collect(),
            conns,
            local_addr,
            accept_task,
        })
    }

    /// Actual bound address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for TcpServerDriver {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn handle_session(
    stream: TcpStream,
    conns: Arc<RwLock<HashMap<Identity, mpsc::Sender<Envelope>>>>,
    inbox_tx: Arc<Vec<mpsc::Sender<Routed>>>,
    shared_key: Option<String>,
) -> Result<(), DriverError> {
    let (mut reader, mut writer) = stream.into_split();

    let hello: Hello = decode(&read_message(&mut reader).await?)?;
    if let Some(expected) = &shared_key {
        if hello.token.as_deref() != Some(expected.as_str()) {
            let ack = HelloAck { ok: false, message: "unauthorized".to_string() };
            let _ = write_message(&mut writer, &encode(&ack)?).await;
            return Err(DriverError::Transport(format!(
                "rejected unauthorized client: {}",
                hello.identity
            )));
        }
    }
    write_message(&mut writer, &encode(&HelloAck { ok: true, message: String::new() })?).await?;

    let identity = Identity::from(hello.identity);
    let (out_tx, out_rx) = mpsc::channel::<Envelope>(OUTBOUND_DEPTH);
    conns.write().insert(identity.clone(), out_tx.clone());
    tracing::info!(%identity, "client session established");

    let write_task = tokio::spawn(drain_outbound(out_rx, writer));

    // Read loop: route inbound envelopes to the per-channel inboxes
    let result = read_loop(&mut reader, &identity, &inbox_tx).await;

    // Teardown: only remove the registration if it is still ours
    {
        let mut conns = conns.write();
        if conns.get(&identity).is_some_and(|tx| tx.same_channel(&out_tx)) {
            conns.remove(&identity);
        }
    }
    write_task.abort();
    tracing::info!(%identity, "client session closed");
    result
}

async fn drain_outbound(mut out_rx: mpsc::Receiver<Envelope>, mut writer: OwnedWriteHalf) {
    while let Some(envelope) = out_rx.recv().await {
        let payload = match encode(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "encode failed");
                continue;
            }
        };
        if let Err(e) = write_message(&mut writer, &payload).await {
            tracing::debug!(error = %e, "write failed, closing session");
            break;
        }
    }
}

async fn read_loop(
    reader: &mut OwnedReadHalf,
    identity: &Identity,
    inbox_tx: &[mpsc::Sender<Routed>],
) -> Result<(), DriverError> {
    loop {
        let payload = match read_message(reader).await {
            Ok(payload) => payload,
            Err(dird_wire::ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let envelope: Envelope = match decode(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(%identity, error = %e, "dropping undecodable frame");
                continue;
            }
        };
        inbox_tx[envelope.channel.index()]
            .send((identity.clone(), envelope.frame))
            .await
            .map_err(|_| DriverError::Closed)?;
    }
}

#[async_trait::async_trait]
impl Driver for TcpServerDriver {
    async fn send(
        &self,
        channel: Channel,
        identity: &Identity,
        frame: Frame,
    ) -> Result<(), DriverError> {
        let tx = {
            let conns = self.conns.read();
            let Some(tx) = conns.get(identity) else {
                return Err(DriverError::Transport(format!("identity not connected: {identity}")));
            };
            tx.clone()
        };
        tx.send(Envelope { channel, frame })
            .await
            .map_err(|_| DriverError::Transport(format!("identity disconnected: {identity}")))
    }

    async fn recv(&self, channel: Channel) -> Result<(Identity, Frame), DriverError> {
        self.inbox[channel.index()].lock().await.recv().await.ok_or(DriverError::Closed)
    }
}

/// Client end: one session to the server.
pub struct TcpClientDriver {
    identity: Identity,
    out_tx: mpsc::Sender<Envelope>,
    inbox: Vec<tokio::sync::Mutex<mpsc::Receiver<Frame>>>,
    read_task: tokio::task::JoinHandle<()>,
}

impl TcpClientDriver {
    pub async fn connect(config: &DriverConfig) -> Result<Self, DriverError> {
        let stream = TcpStream::connect(&config.server_address).await.map_err(transport)?;
        let (mut reader, mut writer) = stream.into_split();

        let identity = config.identity.clone();
        let hello =
            Hello { identity: identity.to_string(), token: config.shared_key.clone() };
        write_message(&mut writer, &encode(&hello)?).await?;
        let ack: HelloAck = decode(&read_message(&mut reader).await?)?;
        if !ack.ok {
            return Err(DriverError::Transport(format!("server refused session: {}", ack.message)));
        }

        let (out_tx, out_rx) = mpsc::channel::<Envelope>(OUTBOUND_DEPTH);
        tokio::spawn(drain_outbound(out_rx, writer));

        let mut route_tx = Vec::with_capacity(Channel::ALL.len());
        let mut inbox = Vec::with_capacity(Channel::ALL.len());
        for _ in Channel::ALL {
            let (tx, rx) = mpsc::channel::<Frame>(OUTBOUND_DEPTH);
            route_tx.push(tx);
            inbox.push(tokio::sync::Mutex::new(rx));
        }

        let read_task = tokio::spawn(async move {
            loop {
                let payload = match read_message(&mut reader).await {
                    Ok(payload) => payload,
                    Err(_) => break,
                };
                let Ok(envelope) = decode::<Envelope>(&payload) else {
                    tracing::warn!("dropping undecodable frame");
                    continue;
                };
                if route_tx[envelope.channel.index()].send(envelope.frame).await.is_err() {
                    break;
                }
            }
        });

        tracing::info!(server = %config.server_address, %identity, "connected");
        Ok(Self { identity, out_tx, inbox, read_task })
    }
}

impl Drop for TcpClientDriver {
    fn drop(&mut self) {
        self.read_task.abort();
    }
}

#[async_trait::async_trait]
impl Driver for TcpClientDriver {
    async fn send(
        &self,
        channel: Channel,
        _identity: &Identity,
        frame: Frame,
    ) -> Result<(), DriverError> {
        self.out_tx.send(Envelope { channel, frame }).await.map_err(|_| DriverError::Closed)
    }

    async fn recv(&self, channel: Channel) -> Result<(Identity, Frame), DriverError> {
        let frame =
            self.inbox[channel.index()].lock().await.recv().await.ok_or(DriverError::Closed)?;
        Ok((self.identity.clone(), frame))
    }
}

#[cfg(test)]
#[path = "tcp_tests.rs"]
mod tests;
