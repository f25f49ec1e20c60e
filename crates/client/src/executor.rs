// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor: runs jobs one at a time against the local components.
//!
//! For each job: render templates from the argument cache, consult the
//! jobs cache for `run_once` hits, execute under the job's timeout,
//! then cache the outcome and return it. Components flagged `no_block`
//! run on a bounded pool instead of the ordered loop.

use dird_components::{ClientCtx, ComponentError, ComponentOutcome, Registry};
use dird_core::consts::{NO_BLOCK_POOL_SIZE, TERMINATE_GRACE};
use dird_core::{Job, JobState, ReturnPayload};
use dird_driver::{send_with_retry, Channel, Driver, Frame};
use dird_store::CacheTag;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};

pub async fn executor_task(
    driver: Arc<dyn Driver>,
    registry: Arc<Registry>,
    ctx: ClientCtx,
    mut queue_rx: mpsc::Receiver<Job>,
) {
    let pool = Arc::new(Semaphore::new(NO_BLOCK_POOL_SIZE));

    while let Some(job) = queue_rx.recv().await {
        // Jobs of an asynchronous parent carry no ordering contract and
        // execute concurrently; the server throttles nothing for them.
        // no_block components run on the bounded pool instead. Ordered
        // jobs stay on this loop, preserving FIFO results.
        if !job.ordered() {
            let driver = Arc::clone(&driver);
            let registry = Arc::clone(&registry);
            let ctx = ctx.clone();
            tokio::spawn(run_one(driver, registry, ctx, job));
        } else if job.no_block()
            || registry.get(&job.verb).is_some_and(|component| component.no_block())
        {
            let permit = match Arc::clone(&pool).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let driver = Arc::clone(&driver);
            let registry = Arc::clone(&registry);
            let ctx = ctx.clone();
            tokio::spawn(async move {
                run_one(driver, registry, ctx, job).await;
                drop(permit);
            });
        } else {
            run_one(Arc::clone(&driver), Arc::clone(&registry), ctx.clone(), job).await;
        }
    }
}

/// Execute one job end to end and emit its result.
pub(crate) async fn run_one(
    driver: Arc<dyn Driver>,
    registry: Arc<Registry>,
    mut ctx: ClientCtx,
    mut job: Job,
) {
    render_definition(&ctx, &mut job);

    // Cache hit: run_once jobs skip re-execution after a success
    if !job.skip_cache() && job.run_once() {
        if let Some(cached) = cached_success(&ctx, &job) {
            tracing::info!(job_id = %job.job_id, job_sha = %job.job_sha, "cache hit");
            emit_result(&driver, &ctx, &job, &cached, 0.0, JobState::Succeeded).await;
            return;
        }
    }

    notify_running(&driver, &ctx, &job).await;

    let cancel = ctx.arm_cancel();
    let started = Instant::now();
    let (outcome, state) = match registry.get(&job.verb) {
        Some(component) => {
            let timeout = Duration::from_secs(job.timeout_seconds());
            let fut = component.client(&ctx, &job);
            tokio::pin!(fut);
            let result = tokio::select! {
                result = &mut fut => result,
                () = tokio::time::sleep(timeout) => {
                    tracing::warn!(job_id = %job.job_id, verb = %job.verb, "job timed out");
                    cancel.cancel();
                    // Cooperative cancellation gets the grace period to
                    // wind down before the future is dropped outright
                    match tokio::time::timeout(TERMINATE_GRACE + Duration::from_secs(1), &mut fut)
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ComponentError::Cancelled),
                    }
                }
            };
            match result {
                Ok(outcome) => {
                    let state =
                        if outcome.success { JobState::Succeeded } else { JobState::Failed };
                    (outcome, state)
                }
                Err(ComponentError::Cancelled) => (
                    ComponentOutcome::failure("timed out"),
                    JobState::Timedout,
                ),
                Err(e) => (ComponentOutcome::failure(e.to_string()), JobState::Failed),
            }
        }
        None => (
            ComponentOutcome::failure(format!("unknown verb: {}", job.verb)),
            JobState::Failed,
        ),
    };
    let execution_seconds = started.elapsed().as_secs_f64();

    finish(&driver, &ctx, &job, outcome, execution_seconds, state).await;
}

/// Post-execution bookkeeping: stdout capture, outcome caching, result
/// emission.
async fn finish(
    driver: &Arc<dyn Driver>,
    ctx: &ClientCtx,
    job: &Job,
    outcome: ComponentOutcome,
    execution_seconds: f64,
    state: JobState,
) {
    let now_ms = ctx.now_ms();

    if state == JobState::Succeeded {
        if let Some(arg) = job.stdout_arg() {
            let trimmed = outcome.stdout.trim_end().to_string();
            if let Err(e) = ctx.caches.put(CacheTag::Args, arg, json!(trimmed), now_ms) {
                tracing::warn!(arg, error = %e, "stdout_arg cache write failed");
            }
        }
    }

    // Outcome lands in the jobs cache regardless of success; hit-skip
    // later requires the cached success flag
    let cached = json!({
        "success": state == JobState::Succeeded,
        "state": state,
        "stdout": outcome.stdout,
        "stderr": outcome.stderr,
        "info": outcome.info,
        "execution_seconds": execution_seconds,
    });
    if let Err(e) = ctx.caches.put(CacheTag::Jobs, &job.job_sha, cached, now_ms) {
        tracing::warn!(job_sha = %job.job_sha, error = %e, "jobs cache write failed");
    }
    if let Err(e) =
        ctx.caches.put(CacheTag::Parents, &job.parent_id, json!(job.job_id), now_ms)
    {
        tracing::warn!(parent_id = %job.parent_id, error = %e, "parents cache write failed");
    }

    emit_result(driver, ctx, job, &outcome, execution_seconds, state).await;
}

fn cached_success(ctx: &ClientCtx, job: &Job) -> Option<ComponentOutcome> {
    let cached = ctx.caches.get(CacheTag::Jobs, &job.job_sha, ctx.now_ms()).ok()??;
    if cached.get("success")?.as_bool()? {
        Some(ComponentOutcome {
            stdout: cached.get("stdout")?.as_str().unwrap_or_default().to_string(),
            stderr: String::new(),
            success: true,
            info: "cached outcome".to_string(),
            callbacks: Vec::new(),
        })
    } else {
        None
    }
}

/// Render `${...}` placeholders in the definition from the arg cache.
fn render_definition(ctx: &ClientCtx, job: &mut Job) {
    let args = match ctx.caches.snapshot_strings(CacheTag::Args, ctx.now_ms()) {
        Ok(args) => args,
        Err(e) => {
            tracing::warn!(error = %e, "arg cache snapshot failed, skipping render");
            return;
        }
    };
    if args.is_empty() {
        return;
    }
    for value in job.definition.values_mut() {
        dird_dsl::interpolate_json(value, &args);
    }
}

async fn notify_running(driver: &Arc<dyn Driver>, ctx: &ClientCtx, job: &Job) {
    let payload = ReturnPayload {
        job_id: job.job_id.clone(),
        state: JobState::Running,
        success: None,
        execution_seconds: 0.0,
        callbacks: Vec::new(),
    };
    let Ok(data) = serde_json::to_value(&payload) else {
        return;
    };
    let frame = Frame::new("running")
        .with_identity(ctx.identity.as_str())
        .with_job_sha(&job.job_sha)
        .with_data(data);
    // Progress notices are advisory; no retry
    if let Err(e) = driver.send(Channel::Return, &ctx.identity, frame).await {
        tracing::debug!(error = %e, "running notice failed");
    }
}

async fn emit_result(
    driver: &Arc<dyn Driver>,
    ctx: &ClientCtx,
    job: &Job,
    outcome: &ComponentOutcome,
    execution_seconds: f64,
    state: JobState,
) {
    let payload = ReturnPayload {
        job_id: job.job_id.clone(),
        state,
        success: Some(state == JobState::Succeeded),
        execution_seconds,
        callbacks: outcome.callbacks.clone(),
    };
    let data = match serde_json::to_value(&payload) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "result serialize failed");
            return;
        }
    };
    let mut frame = Frame::new("result")
        .with_identity(ctx.identity.as_str())
        .with_job_sha(&job.job_sha)
        .with_data(data);
    frame.stdout = outcome.stdout.clone();
    frame.stderr = outcome.stderr.clone();
    frame.info = outcome.info.clone();

    tracing::info!(
        job_id = %job.job_id,
        verb = %job.verb,
        %state,
        execution_seconds,
        "result emitted"
    );
    if let Err(e) = send_with_retry(driver.as_ref(), Channel::Return, &ctx.identity, frame).await
    {
        tracing::error!(job_id = %job.job_id, error = %e, "result undeliverable");
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
