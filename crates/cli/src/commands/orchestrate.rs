// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dird orchestrate`: submit orchestration files, optionally waiting
//! for completion.

use crate::client_conn;
use crate::config::Settings;
use crate::exit_error::ExitError;
use dird_core::JobState;
use dird_dsl::OrchestrationDoc;
use dird_wire::{Request, Response};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct OrchestrateParams {
    pub files: Vec<PathBuf>,
    pub targets: Vec<String>,
    pub restrict: Vec<String>,
    pub ignore_cache: bool,
    pub wait: bool,
    pub vars: Vec<(String, String)>,
}

pub async fn run(settings: &Settings, params: OrchestrateParams) -> Result<(), ExitError> {
    let mut docs = Vec::new();
    for file in &params.files {
        docs.extend(load_file(file)?);
    }
    if docs.is_empty() {
        return Err(ExitError::invalid("no orchestrations found in the given files"));
    }

    let overrides: HashMap<String, String> = params.vars.into_iter().collect();
    let response = client_conn::request(
        &settings.socket_path,
        &Request::SubmitOrchestrations {
            docs,
            targets: params.targets,
            restrict: params.restrict,
            ignore_cache: params.ignore_cache,
            overrides,
        },
    )
    .await?;

    let Response::Accepted { parent_ids } = response else {
        return Err(ExitError::failure(format!("unexpected response: {response:?}")));
    };
    for parent_id in &parent_ids {
        println!("accepted: {parent_id}");
    }

    if params.wait {
        wait_for_parents(settings, &parent_ids).await?;
    }
    Ok(())
}

/// Parse one orchestration file.
pub(crate) fn load_file(path: &Path) -> Result<Vec<OrchestrationDoc>, ExitError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ExitError::invalid(format!("cannot read {}: {e}", path.display())))?;
    dird_dsl::load_documents(&text)
        .map_err(|e| ExitError::invalid(format!("{}: {e}", path.display())))
}

/// Poll the job table until every job under the given parents settles.
/// Fails (exit 1) when any job finished unsuccessfully.
pub(crate) async fn wait_for_parents(
    settings: &Settings,
    parent_ids: &[String],
) -> Result<(), ExitError> {
    loop {
        let response = client_conn::request(&settings.socket_path, &Request::ListJobs).await?;
        let Response::Jobs { jobs } = response else {
            return Err(ExitError::failure(format!("unexpected response: {response:?}")));
        };

        let mine: Vec<_> =
            jobs.iter().filter(|j| parent_ids.contains(&j.parent_id)).collect();
        if !mine.is_empty() && mine.iter().all(|j| j.state.is_terminal()) {
            let mut failed = 0usize;
            for job in &mine {
                println!("{} {} {}", job.job_id, job.verb, job.state);
                if job.state != JobState::Succeeded {
                    failed += 1;
                }
            }
            if failed > 0 {
                return Err(ExitError::failure(format!("{failed} job(s) failed")));
            }
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
