// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dird server`: run the coordinator until shutdown.

use crate::config::Settings;
use crate::exit_error::ExitError;
use dird_core::SystemClock;
use dird_server::{Server, ServerConfig};
use std::sync::Arc;

pub async fn run(settings: &Settings) -> Result<(), ExitError> {
    let config = ServerConfig {
        socket_path: settings.socket_path.clone(),
        datastore: settings.datastore.clone(),
        driver: settings.driver_config(),
        component_path: settings.component_path.clone(),
    };

    let server = Server::start(config, Arc::new(SystemClock))
        .await
        .map_err(|e| ExitError::failure(format!("server startup failed: {e}")))?;

    let handle = server.ctx.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            handle.notify_waiters();
        }
    });

    server.wait().await;
    Ok(())
}
