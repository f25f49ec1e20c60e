// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Return manager: idempotent aggregation of results.
//!
//! Delivery on the return channel is at-least-once; merging is keyed
//! by `(job_id, identity)` and a terminal per-node result is never
//! downgraded, so duplicates are harmless.

use crate::ctx::ServerCtx;
use dird_core::{Identity, JobState, NodeResult, ReturnPayload};
use dird_driver::{Channel, DriverError, Frame};
use std::sync::Arc;

pub async fn return_task(ctx: Arc<ServerCtx>) {
    loop {
        match ctx.driver.recv(Channel::Return).await {
            Ok((identity, frame)) => handle_return(&ctx, identity, frame).await,
            Err(DriverError::Closed) => {
                tracing::debug!("return channel closed");
                return;
            }
            Err(e) => tracing::warn!(error = %e, "return receive error"),
        }
    }
}

async fn handle_return(ctx: &Arc<ServerCtx>, identity: Identity, frame: Frame) {
    let payload: ReturnPayload = match serde_json::from_value(frame.data) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(%identity, error = %e, "dropping malformed return frame");
            return;
        }
    };

    let now_ms = ctx.now_ms();
    let applied = ctx.tables.with_job_mut(&payload.job_id, |job| {
        let roundtrip_seconds = job
            .transmitted_at_ms
            .map_or(0.0, |t| now_ms.saturating_sub(t) as f64 / 1_000.0);
        job.apply_result(
            &identity,
            NodeResult {
                state: payload.state,
                stdout: frame.stdout.clone(),
                stderr: frame.stderr.clone(),
                info: frame.info.clone(),
                success: payload.success,
                execution_seconds: payload.execution_seconds,
                roundtrip_seconds,
            },
            now_ms,
        );
        job.parent_id.clone()
    });

    let Some(parent_id) = applied else {
        tracing::warn!(job_id = %payload.job_id, %identity, "return for unknown job");
        return;
    };

    if payload.state.is_terminal() {
        tracing::info!(
            job_id = %payload.job_id,
            %identity,
            state = %payload.state,
            execution_seconds = payload.execution_seconds,
            "result recorded"
        );
    } else {
        tracing::debug!(job_id = %payload.job_id, %identity, state = %payload.state, "progress");
    }

    // Components may spawn follow-up jobs; they join the same parent
    // with the async gate bypassed.
    for spec in &payload.callbacks {
        match dird_dsl::compile_callback(spec, &parent_id, ctx.registry.as_ref(), now_ms) {
            Ok(job) => {
                tracing::debug!(verb = %job.verb, parent_id = %parent_id, "callback job");
                ctx.submit(vec![job]).await;
            }
            Err(e) => {
                tracing::warn!(%identity, verb = %spec.verb, error = %e, "bad callback spec");
            }
        }
    }

    // A settled result may open an ordered queue
    if payload.state == JobState::Running {
        return;
    }
    ctx.dispatch_wake.notify_one();
}

#[cfg(test)]
#[path = "returns_tests.rs"]
mod tests;
