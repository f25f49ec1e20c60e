// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process reference transport.
//!
//! A hub owns one inbox per channel for the server plus one per
//! `(client, channel)` pair, all ordinary mpsc queues. Order within a
//! `(identity, channel)` pair falls out of the queue; there is no
//! cross-identity coupling. Used by tests and single-process runs.

use crate::{Channel, Driver, DriverError, Frame};
use dird_core::Identity;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio::sync::mpsc;

const CHANNEL_DEPTH: usize = 256;

type Routed = (Identity, Frame);

/// Rendezvous point between one server end and any number of clients.
pub struct InprocHub {
    server_tx: Vec<mpsc::Sender<Routed>>,
    server_rx: Mutex<Option<Vec<mpsc::Receiver<Routed>>>>,
    clients: RwLock<HashMap<Identity, Vec<mpsc::Sender<Frame>>>>,
}

impl InprocHub {
    pub fn new() -> Arc<Self> {
        let mut server_tx = Vec::with_capacity(Channel::ALL.len());
        let mut server_rx = Vec::with_capacity(Channel::ALL.len());
        for _ in Channel::ALL {
            let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
            server_tx.push(tx);
            server_rx.push(rx);
        }
        Arc::new(Self {
            server_tx,
            server_rx: Mutex::new(Some(server_rx)),
            clients: RwLock::new(HashMap::new()),
        })
    }

    /// Take the server end. Only one server may exist per hub.
    pub fn server(self: &Arc<Self>) -> Result<InprocServer, DriverError> {
        let receivers = self
            .server_rx
            .lock()
            .take()
            .ok_or_else(|| DriverError::Transport("inproc server already bound".to_string()))?;
        Ok(InprocServer {
            hub: Arc::clone(self),
            inbox: receivers.into_iter().map(tokio::sync::Mutex::new).collect(),
        })
    }

    /// Register a client end under an identity.
    ///
    /// Reconnecting under the same identity replaces the old routes; the
    /// stale end starts seeing `Closed`.
    pub fn client(self: &Arc<Self>, identity: Identity) -> InprocClient {
        let mut senders = Vec::with_capacity(Channel::ALL.len());
        let mut receivers = Vec::with_capacity(Channel::ALL.len());
        for _ in Channel::ALL {
            let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
            senders.push(tx);
            receivers.push(rx);
        }
        let route_probe = senders[0].clone();
        self.clients.write().insert(identity.clone(), senders);
        InprocClient {
            hub: Arc::clone(self),
            identity,
            inbox: receivers.into_iter().map(tokio::sync::Mutex::new).collect(),
            route_probe,
        }
    }

    /// Drop a client's routes (teardown).
    pub fn disconnect(&self, identity: &Identity) {
        self.clients.write().remove(identity);
    }
}

/// Server end of an inproc hub.
pub struct InprocServer {
    hub: Arc<InprocHub>,
    inbox: Vec<tokio::sync::Mutex<mpsc::Receiver<Routed>>>,
}

#[async_trait::async_trait]
impl Driver for InprocServer {
    async fn send(
        &self,
        channel: Channel,
        identity: &Identity,
        frame: Frame,
    ) -> Result<(), DriverError> {
        let tx = {
            let clients = self.hub.clients.read();
            let Some(routes) = clients.get(identity) else {
                return Err(DriverError::Transport(format!("identity not connected: {identity}")));
            };
            routes[channel.index()].clone()
        };
        tx.send(frame)
            .await
            .map_err(|_| DriverError::Transport(format!("identity disconnected: {identity}")))
    }

    async fn recv(&self, channel: Channel) -> Result<(Identity, Frame), DriverError> {
        self.inbox[channel.index()].lock().await.recv().await.ok_or(DriverError::Closed)
    }
}

/// Client end of an inproc hub.
pub struct InprocClient {
    hub: Arc<InprocHub>,
    identity: Identity,
    inbox: Vec<tokio::sync::Mutex<mpsc::Receiver<Frame>>>,
    /// Clone of our registered route, to avoid tearing down a
    /// replacement client that reused the identity
    route_probe: mpsc::Sender<Frame>,
}

#[async_trait::async_trait]
impl Driver for InprocClient {
    async fn send(
        &self,
        channel: Channel,
        _identity: &Identity,
        frame: Frame,
    ) -> Result<(), DriverError> {
        // Frames route under this client's own identity
        self.hub.server_tx[channel.index()]
            .send((self.identity.clone(), frame))
            .await
            .map_err(|_| DriverError::Closed)
    }

    async fn recv(&self, channel: Channel) -> Result<(Identity, Frame), DriverError> {
        let frame =
            self.inbox[channel.index()].lock().await.recv().await.ok_or(DriverError::Closed)?;
        Ok((self.identity.clone(), frame))
    }
}

impl Drop for InprocClient {
    fn drop(&mut self) {
        let mut clients = self.hub.clients.write();
        if clients.get(&self.identity).is_some_and(|r| r[0].same_channel(&self.route_probe)) {
            clients.remove(&self.identity);
        }
    }
}

/// Named hubs, so `driver = "inproc"` works through configuration when
/// server and client share a process.
static HUBS: LazyLock<Mutex<HashMap<String, Arc<InprocHub>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn named_hub(name: &str) -> Arc<InprocHub> {
    Arc::clone(HUBS.lock().entry(name.to_string()).or_insert_with(InprocHub::new))
}

pub(crate) fn bind_named(name: &str) -> Result<Arc<dyn Driver>, DriverError> {
    Ok(Arc::new(named_hub(name).server()?))
}

pub(crate) fn connect_named(
    name: &str,
    identity: &Identity,
) -> Result<Arc<dyn Driver>, DriverError> {
    Ok(Arc::new(named_hub(name).client(identity.clone())))
}

#[cfg(test)]
#[path = "inproc_tests.rs"]
mod tests;
