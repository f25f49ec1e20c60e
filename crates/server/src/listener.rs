// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the local control socket.
//!
//! Accepts connections on a UNIX socket and handles each in a spawned
//! task without blocking the coordinator. The socket's filesystem
//! permissions are the only trust boundary for user-facing commands.

use crate::ctx::ServerCtx;
use dird_core::{analyze_job, analyze_parent};
use dird_dsl::CompileOptions;
use dird_wire::{self as wire, JobDetail, JobSummary, NodeEntry, Request, Response};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixListener;

const IPC_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Listener {
    unix: UnixListener,
    ctx: Arc<ServerCtx>,
}

impl Listener {
    /// Bind the control socket, replacing a stale socket file, and set
    /// group-writable permissions (the trust boundary).
    pub fn bind(path: &Path, ctx: Arc<ServerCtx>) -> Result<Self, crate::CoordinatorError> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let unix = UnixListener::bind(path)?;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o660))?;
        tracing::info!(socket = %path.display(), "control socket listening");
        Ok(Self { unix, ctx })
    }

    /// Accept loop; one spawned handler per connection.
    pub async fn run(self) {
        loop {
            tokio::select! {
                result = self.unix.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &ctx).await {
                                    log_connection_error(&e);
                                }
                            });
                        }
                        Err(e) => tracing::error!(error = %e, "accept error"),
                    }
                }
                () = self.ctx.shutdown.notified() => return,
            }
        }
    }
}

fn log_connection_error(e: &crate::CoordinatorError) {
    match e {
        crate::CoordinatorError::Protocol(wire::ProtocolError::ConnectionClosed) => {
            tracing::debug!("client disconnected");
        }
        crate::CoordinatorError::Protocol(wire::ProtocolError::Timeout) => {
            tracing::warn!("connection timeout");
        }
        other => tracing::error!(error = %other, "connection error"),
    }
}

async fn handle_connection(
    mut stream: tokio::net::UnixStream,
    ctx: &Arc<ServerCtx>,
) -> Result<(), crate::CoordinatorError> {
    let (mut reader, mut writer) = stream.split();
    let request = wire::read_request(&mut reader, IPC_TIMEOUT).await?;

    if matches!(request, Request::ListJobs | Request::ListNodes | Request::PollJob { .. }) {
        tracing::debug!(request = ?request, "received query");
    } else {
        tracing::info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;
    wire::write_response(&mut writer, &response, IPC_TIMEOUT).await?;
    Ok(())
}

async fn handle_request(request: Request, ctx: &Arc<ServerCtx>) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::SubmitOrchestrations { docs, targets, restrict, ignore_cache, overrides } => {
            let opts = CompileOptions { targets, restrict, ignore_cache, overrides };
            match dird_dsl::compile(&docs, ctx.registry.as_ref(), &opts, ctx.now_ms()) {
                Ok(jobs) if jobs.is_empty() => {
                    Response::Error { message: "nothing to run".to_string() }
                }
                Ok(jobs) => {
                    let mut parent_ids: Vec<String> =
                        jobs.iter().map(|j| j.parent_id.clone()).collect();
                    parent_ids.dedup();
                    ctx.submit(jobs).await;
                    Response::Accepted { parent_ids }
                }
                Err(e) => Response::Error { message: e.to_string() },
            }
        }

        Request::SubmitExec { verb, args, targets } => {
            let opts = CompileOptions::default();
            match dird_dsl::compile_exec(
                &verb,
                &args,
                &targets,
                ctx.registry.as_ref(),
                &opts,
                ctx.now_ms(),
            ) {
                Ok(job) => {
                    let parent_ids = vec![job.parent_id.clone()];
                    ctx.submit(vec![job]).await;
                    Response::Accepted { parent_ids }
                }
                Err(e) => Response::Error { message: e.to_string() },
            }
        }

        Request::ListNodes => {
            let now_ms = ctx.now_ms();
            let mut nodes: Vec<NodeEntry> = ctx
                .tables
                .workers_snapshot()
                .iter()
                .map(|record| NodeEntry::from_record(record, now_ms))
                .collect();
            nodes.sort_by(|a, b| a.identity.cmp(&b.identity));
            Response::Nodes { nodes }
        }

        Request::ListJobs => {
            let jobs = ctx.tables.jobs_snapshot().iter().map(JobSummary::from).collect();
            Response::Jobs { jobs }
        }

        Request::JobInfo { id } => Response::Job {
            job: ctx.tables.job_by_prefix(&id).map(|job| Box::new(JobDetail::from(&job))),
        },

        Request::PollJob { id } => match ctx.tables.job_by_prefix(&id) {
            Some(job) => {
                let done = job.is_terminal();
                let success = done.then_some(job.state == dird_core::JobState::Succeeded);
                let info = match &job.failure_reason {
                    Some(reason) => reason.clone(),
                    None => job.state.to_string(),
                };
                Response::Poll { done, success, info }
            }
            None => Response::Error { message: format!("unknown job: {id}") },
        },

        Request::PurgeJobs => Response::Purged { count: ctx.tables.purge_jobs() },

        Request::PurgeNodes => Response::Purged { count: ctx.tables.purge_nodes() },

        Request::ExportJobs { path } => export_jobs(ctx, &path).await,

        Request::AnalyzeJob { id } => match ctx.tables.job_by_prefix(&id) {
            Some(job) => Response::Analysis { report: Box::new(analyze_job(&job)) },
            None => Response::Error { message: format!("unknown job: {id}") },
        },

        Request::AnalyzeParent { id } => {
            let jobs = ctx.tables.jobs_for_parent(&id);
            if jobs.is_empty() {
                return Response::Error { message: format!("unknown parent: {id}") };
            }
            let refs: Vec<&dird_core::Job> = jobs.iter().collect();
            Response::ParentAnalysis { report: Box::new(analyze_parent(&id, &refs)) }
        }

        Request::GenerateKeys => Response::Keys {
            message: "the configured driver carries no key material".to_string(),
        },

        Request::RunUi => {
            Response::Error { message: "the dashboard is not built into this server".to_string() }
        }

        Request::Shutdown => {
            ctx.shutdown.notify_waiters();
            Response::ShuttingDown
        }
    }
}

async fn export_jobs(ctx: &Arc<ServerCtx>, path: &PathBuf) -> Response {
    let jobs = ctx.tables.jobs_snapshot();
    let count = jobs.len();
    let payload = match serde_json::to_vec_pretty(&jobs) {
        Ok(payload) => payload,
        Err(e) => return Response::Error { message: format!("serialize failed: {e}") },
    };
    match tokio::fs::write(path, payload).await {
        Ok(()) => Response::Exported { path: path.clone(), count },
        Err(e) => Response::Error { message: format!("write {} failed: {e}", path.display()) },
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
