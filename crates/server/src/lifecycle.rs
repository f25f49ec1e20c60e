// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server startup and shutdown.
//!
//! Startup is fail-fast: an unreadable component directory, an
//! unavailable datastore, or a bind failure aborts with an error
//! before any task spawns.

use crate::ctx::ServerCtx;
use crate::dispatch::Dispatcher;
use crate::listener::Listener;
use crate::tables::Tables;
use crate::{heartbeat, returns, transfer, CoordinatorError};
use dird_components::Registry;
use dird_core::DynClock;
use dird_driver::DriverConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

const SUBMIT_DEPTH: usize = 256;

/// Coordinator configuration, resolved from file and flags by the CLI.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// UNIX socket path for the local control interface
    pub socket_path: PathBuf,
    /// Datastore URL: `memory` or `file:///...`
    pub datastore: String,
    pub driver: DriverConfig,
    /// Extra directory of user-defined components
    pub component_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/var/run/directord.sock"),
            datastore: "memory".to_string(),
            driver: DriverConfig::default(),
            component_path: None,
        }
    }
}

/// A running coordinator: all role tasks plus the shared context.
pub struct Server {
    pub ctx: Arc<ServerCtx>,
    socket_path: PathBuf,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Server {
    /// Bind everything and spawn the role tasks.
    pub async fn start(
        config: ServerConfig,
        clock: Arc<dyn DynClock>,
    ) -> Result<Self, CoordinatorError> {
        let store = dird_store::open(&config.datastore)?;
        let tables = Arc::new(Tables::load(store)?);

        let mut registry = Registry::with_builtins();
        if let Some(dir) = &config.component_path {
            let count = registry
                .load_user_components(dir)
                .map_err(|e| CoordinatorError::Io(std::io::Error::other(e.to_string())))?;
            if count > 0 {
                tracing::info!(count, dir = %dir.display(), "user components loaded");
            }
        }

        let driver = dird_driver::bind(&config.driver).await?;

        let (submit_tx, submit_rx) = mpsc::channel(SUBMIT_DEPTH);
        let ctx = Arc::new(ServerCtx {
            tables,
            driver,
            clock,
            registry: Arc::new(registry),
            submit_tx,
            dispatch_wake: Arc::new(Notify::new()),
            shutdown: Arc::new(Notify::new()),
        });

        let listener = Listener::bind(&config.socket_path, Arc::clone(&ctx))?;

        let tasks = vec![
            tokio::spawn(heartbeat::heartbeat_task(Arc::clone(&ctx))),
            tokio::spawn(heartbeat::expiry_sweep_task(Arc::clone(&ctx))),
            tokio::spawn(Dispatcher::new(Arc::clone(&ctx)).run(submit_rx)),
            tokio::spawn(returns::return_task(Arc::clone(&ctx))),
            tokio::spawn(transfer::transfer_task(Arc::clone(&ctx))),
            tokio::spawn(listener.run()),
        ];

        tracing::info!("coordinator started");
        Ok(Self { ctx, socket_path: config.socket_path, tasks })
    }

    /// Block until a shutdown request arrives, then tear down.
    pub async fn wait(mut self) {
        self.ctx.shutdown.notified().await;
        tracing::info!("shutting down");
        for task in self.tasks.drain(..) {
            task.abort();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }

    /// Request shutdown from the owning process.
    pub fn shutdown(&self) {
        self.ctx.shutdown.notify_waiters();
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
