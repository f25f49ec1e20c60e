// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File source over the driver's transfer channel.
//!
//! ADD/COPY asks the server for file bytes; the reply carries base64
//! content. One fetch at a time: the channel's reply stream belongs to
//! whoever holds the lock.

use base64::Engine;
use dird_components::{ComponentError, FileSource};
use dird_core::Identity;
use dird_driver::{Channel, Driver, Frame};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DriverFileSource {
    driver: Arc<dyn Driver>,
    identity: Identity,
    fetch_lock: tokio::sync::Mutex<()>,
}

impl DriverFileSource {
    pub fn new(driver: Arc<dyn Driver>, identity: Identity) -> Self {
        Self { driver, identity, fetch_lock: tokio::sync::Mutex::new(()) }
    }
}

#[async_trait::async_trait]
impl FileSource for DriverFileSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ComponentError> {
        let _guard = self.fetch_lock.lock().await;

        let request = Frame::new("fetch")
            .with_identity(self.identity.as_str())
            .with_data(json!({"path": path}));
        self.driver
            .send(Channel::Transfer, &self.identity, request)
            .await
            .map_err(|e| ComponentError::Transfer(e.to_string()))?;

        let (_, reply) = self
            .driver
            .recv_timeout(Channel::Transfer, FETCH_TIMEOUT)
            .await
            .map_err(|e| ComponentError::Transfer(e.to_string()))?;

        if reply.control.nack {
            let detail = reply
                .data
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown error");
            return Err(ComponentError::Transfer(format!("{path}: {detail}")));
        }
        let content = reply
            .data
            .get("content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| ComponentError::Transfer(format!("{path}: reply without content")))?;
        base64::engine::general_purpose::STANDARD
            .decode(content)
            .map_err(|e| ComponentError::Transfer(format!("{path}: {e}")))
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
