// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket client: one framed request, one framed response.

use crate::exit_error::ExitError;
use dird_wire::{read_response, write_request, Request, Response};
use std::path::Path;
use std::time::Duration;
use tokio::net::UnixStream;

const IPC_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn request(socket: &Path, request: &Request) -> Result<Response, ExitError> {
    let mut stream = UnixStream::connect(socket).await.map_err(|e| {
        ExitError::failure(format!(
            "cannot reach the server at {} ({e}); is it running?",
            socket.display()
        ))
    })?;
    let (mut reader, mut writer) = stream.split();

    write_request(&mut writer, request, IPC_TIMEOUT)
        .await
        .map_err(|e| ExitError::failure(format!("request failed: {e}")))?;
    let response = read_response(&mut reader, IPC_TIMEOUT)
        .await
        .map_err(|e| ExitError::failure(format!("no response: {e}")))?;

    match response {
        Response::Error { message } => Err(ExitError::failure(message)),
        other => Ok(other),
    }
}
