// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dird bootstrap`: run catalog orchestrations with bounded
//! concurrency.
//!
//! Each catalog is an ordinary orchestration file; catalogs submit
//! concurrently up to the thread bound and each one is waited to
//! completion. Node provisioning itself (SSH, units, certs) lives
//! outside this tool.

use crate::client_conn;
use crate::config::Settings;
use crate::exit_error::ExitError;
use dird_wire::{Request, Response};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub async fn run(
    settings: &Settings,
    catalogs: Vec<PathBuf>,
    thread: usize,
) -> Result<(), ExitError> {
    if thread == 0 {
        return Err(ExitError::invalid("--thread must be at least 1"));
    }

    let limit = Arc::new(Semaphore::new(thread));
    let mut handles = Vec::new();
    for catalog in catalogs {
        let settings = settings.clone();
        let limit = Arc::clone(&limit);
        handles.push(tokio::spawn(async move {
            let _permit = limit.acquire_owned().await;
            run_catalog(&settings, &catalog).await.map(|()| catalog)
        }));
    }

    let mut failures = 0usize;
    for handle in handles {
        match handle.await {
            Ok(Ok(catalog)) => println!("catalog done: {}", catalog.display()),
            Ok(Err(e)) => {
                eprintln!("catalog failed: {e}");
                failures += 1;
            }
            Err(e) => {
                eprintln!("catalog task failed: {e}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(ExitError::failure(format!("{failures} catalog(s) failed")));
    }
    Ok(())
}

async fn run_catalog(settings: &Settings, catalog: &PathBuf) -> Result<(), ExitError> {
    let docs = super::orchestrate::load_file(catalog)?;
    if docs.is_empty() {
        return Err(ExitError::invalid(format!("{}: empty catalog", catalog.display())));
    }

    let response = client_conn::request(
        &settings.socket_path,
        &Request::SubmitOrchestrations {
            docs,
            targets: Vec::new(),
            restrict: Vec::new(),
            ignore_cache: false,
            overrides: Default::default(),
        },
    )
    .await?;

    let Response::Accepted { parent_ids } = response else {
        return Err(ExitError::failure(format!("unexpected response: {response:?}")));
    };
    super::orchestrate::wait_for_parents(settings, &parent_ids).await
}
