// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dird client`: run a worker until interrupted.

use crate::config::Settings;
use crate::exit_error::ExitError;
use dird_client::{Worker, WorkerConfig};
use dird_core::SystemClock;
use std::sync::Arc;

pub async fn run(settings: &Settings) -> Result<(), ExitError> {
    let config = WorkerConfig {
        driver: settings.driver_config(),
        cache_store: settings.datastore.clone(),
        cache_ttl_secs: settings.cache_ttl,
        heartbeat_interval_secs: settings.heartbeat_interval,
        component_path: settings.component_path.clone(),
    };

    let worker = Worker::start(config, Arc::new(SystemClock))
        .await
        .map_err(|e| ExitError::failure(format!("worker startup failed: {e}")))?;

    tokio::select! {
        () = worker.wait() => {}
        result = tokio::signal::ctrl_c() => {
            if result.is_ok() {
                tracing::info!("interrupt received");
            }
        }
    }
    Ok(())
}
