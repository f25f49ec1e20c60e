// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker wiring: connect the driver, open the caches, spawn the role
//! tasks.

use crate::{executor, heartbeat, ingest, DriverFileSource, WorkerError};
use dird_components::{ClientCtx, Registry};
use dird_core::consts::{DEFAULT_CACHE_TTL_SECS, HEARTBEAT_INTERVAL_SECS};
use dird_core::DynClock;
use dird_driver::DriverConfig;
use dird_store::CacheStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const QUEUE_DEPTH: usize = 256;

/// Worker configuration, resolved from file and flags by the CLI.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub driver: DriverConfig,
    /// Cache backing store URL: `memory` or `file:///...`
    pub cache_store: String,
    pub cache_ttl_secs: u64,
    pub heartbeat_interval_secs: u64,
    /// Extra directory of user-defined components
    pub component_path: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            cache_store: "memory".to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            heartbeat_interval_secs: HEARTBEAT_INTERVAL_SECS,
            component_path: None,
        }
    }
}

/// A running worker: heartbeat emitter, job ingest, executor.
pub struct Worker {
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Worker {
    pub async fn start(
        config: WorkerConfig,
        clock: Arc<dyn DynClock>,
    ) -> Result<Self, WorkerError> {
        let identity = config.driver.identity.clone();

        let store = dird_store::open(&config.cache_store)?;
        let caches = CacheStore::new(store, config.cache_ttl_secs);

        let mut registry = Registry::with_builtins();
        if let Some(dir) = &config.component_path {
            let count = registry.load_user_components(dir)?;
            if count > 0 {
                tracing::info!(count, dir = %dir.display(), "user components loaded");
            }
        }
        let registry = Arc::new(registry);

        let driver = dird_driver::connect(&config.driver).await?;
        let files = Arc::new(DriverFileSource::new(Arc::clone(&driver), identity.clone()));
        let ctx = ClientCtx::new(identity.clone(), caches, clock, files);

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_DEPTH);
        let tasks = vec![
            tokio::spawn(heartbeat::heartbeat_task(
                Arc::clone(&driver),
                identity.clone(),
                registry.verbs(),
                Duration::from_secs(config.heartbeat_interval_secs),
            )),
            tokio::spawn(ingest::ingest_task(Arc::clone(&driver), identity.clone(), queue_tx)),
            tokio::spawn(executor::executor_task(driver, Arc::clone(&registry), ctx, queue_rx)),
        ];

        tracing::info!(%identity, "worker started");
        Ok(Self { tasks })
    }

    /// Run until the process is told to stop. The worker has no local
    /// control surface; it stops with its process.
    pub async fn wait(self) {
        std::future::pending::<()>().await;
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
