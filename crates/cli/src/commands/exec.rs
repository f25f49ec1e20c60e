// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dird exec`: one-shot execution of a single verb.

use crate::client_conn;
use crate::config::Settings;
use crate::exit_error::ExitError;
use dird_wire::{Request, Response};

pub async fn run(
    settings: &Settings,
    verb: String,
    args: String,
    targets: Vec<String>,
    wait: bool,
) -> Result<(), ExitError> {
    let response = client_conn::request(
        &settings.socket_path,
        &Request::SubmitExec { verb, args, targets },
    )
    .await?;

    let Response::Accepted { parent_ids } = response else {
        return Err(ExitError::failure(format!("unexpected response: {response:?}")));
    };
    for parent_id in &parent_ids {
        println!("accepted: {parent_id}");
    }

    if wait {
        super::orchestrate::wait_for_parents(settings, &parent_ids).await?;
    }
    Ok(())
}
