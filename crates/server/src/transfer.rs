// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer server: answers file-fetch requests from clients.
//!
//! ADD/COPY on a client asks for server-side file bytes with a `fetch`
//! frame; the reply carries base64 content (frames are JSON). Errors
//! come back as nacked frames so the component fails cleanly instead
//! of waiting out its timeout.

use crate::ctx::ServerCtx;
use base64::Engine;
use dird_driver::{Channel, DriverError, Frame};
use serde_json::json;
use std::sync::Arc;

pub async fn transfer_task(ctx: Arc<ServerCtx>) {
    loop {
        match ctx.driver.recv(Channel::Transfer).await {
            Ok((identity, request)) => {
                let path = request.data.get("path").and_then(|p| p.as_str()).map(str::to_string);
                let reply = match path {
                    Some(path) => match tokio::fs::read(&path).await {
                        Ok(bytes) => {
                            tracing::debug!(%identity, %path, len = bytes.len(), "serving file");
                            Frame::new("fetch")
                                .with_identity(identity.as_str())
                                .with_data(json!({
                                    "path": path,
                                    "content": base64::engine::general_purpose::STANDARD
                                        .encode(&bytes),
                                }))
                        }
                        Err(e) => {
                            tracing::warn!(%identity, %path, error = %e, "fetch failed");
                            Frame::new("fetch")
                                .with_identity(identity.as_str())
                                .with_data(json!({"path": path, "error": e.to_string()}))
                                .nacked()
                        }
                    },
                    None => Frame::new("fetch")
                        .with_identity(identity.as_str())
                        .with_data(json!({"error": "missing path"}))
                        .nacked(),
                };
                if let Err(e) = ctx.driver.send(Channel::Transfer, &identity, reply).await {
                    tracing::warn!(%identity, error = %e, "transfer reply failed");
                }
            }
            Err(DriverError::Closed) => {
                tracing::debug!("transfer channel closed");
                return;
            }
            Err(e) => tracing::warn!(error = %e, "transfer receive error"),
        }
    }
}
