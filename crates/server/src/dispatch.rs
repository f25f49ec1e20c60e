// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher: targeting, per-identity FIFO queues, the async gate,
//! and per-job deadlines.
//!
//! Targeting intersects explicit targets (or all alive identities)
//! with any restrict list. Per identity, jobs leave in submission
//! order; with a synchronous parent, job n+1 does not leave until job
//! n is terminal for that identity. Sends run on per-identity lanes so
//! one slow identity never blocks the rest.

use crate::ctx::ServerCtx;
use dird_core::consts::{NETWORK_SLACK, TARGET_GRACE};
use dird_core::{Identity, Job, JobState, NodeResult};
use dird_driver::{send_with_retry, Channel, Frame};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const PASS_INTERVAL: std::time::Duration = std::time::Duration::from_millis(250);
const LANE_DEPTH: usize = 64;

/// A job waiting for at least one live target.
struct Untargeted {
    job_id: String,
    since: Instant,
}

pub struct Dispatcher {
    ctx: Arc<ServerCtx>,
    untargeted: VecDeque<Untargeted>,
    queues: HashMap<Identity, VecDeque<String>>,
    lanes: HashMap<Identity, mpsc::Sender<String>>,
    /// In-flight ordered job per (identity, parent)
    gates: HashMap<(Identity, String), String>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<ServerCtx>) -> Self {
        Self {
            ctx,
            untargeted: VecDeque::new(),
            queues: HashMap::new(),
            lanes: HashMap::new(),
            gates: HashMap::new(),
        }
    }

    /// Main loop: submissions, wakes from the return manager, and a
    /// periodic pass for grace and timeout accounting.
    pub async fn run(mut self, mut submit_rx: mpsc::Receiver<Vec<Job>>) {
        let mut interval = tokio::time::interval(PASS_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                submission = submit_rx.recv() => {
                    match submission {
                        Some(jobs) => {
                            for job in jobs {
                                self.untargeted.push_back(Untargeted {
                                    job_id: job.job_id,
                                    since: self.ctx.clock.monotonic(),
                                });
                            }
                        }
                        None => {
                            tracing::debug!("submission channel closed");
                            return;
                        }
                    }
                }
                _ = self.ctx.dispatch_wake.notified() => {}
                _ = interval.tick() => {}
                () = self.ctx.shutdown.notified() => return,
            }
            self.pass();
        }
    }

    /// One scheduling pass: resolve targets, advance queues, expire
    /// overdue jobs.
    fn pass(&mut self) {
        self.resolve_targets();
        self.advance_queues();
        self.expire_overdue();
    }

    fn resolve_targets(&mut self) {
        let now_ms = self.ctx.now_ms();
        let alive = self.ctx.tables.alive_identities(now_ms);
        let mut still_waiting = VecDeque::new();

        while let Some(waiting) = self.untargeted.pop_front() {
            let Some(job) = self.ctx.tables.job(&waiting.job_id) else {
                continue;
            };
            if job.is_terminal() {
                continue;
            }

            let targets = resolve(&job, &alive);
            if targets.is_empty() {
                let waited = self.ctx.clock.monotonic().duration_since(waiting.since);
                if waited >= TARGET_GRACE {
                    tracing::warn!(job_id = %job.job_id, verb = %job.verb, "no live targets");
                    self.ctx
                        .tables
                        .with_job_mut(&waiting.job_id, |j| j.fail_undispatched("no_targets", now_ms));
                } else {
                    still_waiting.push_back(waiting);
                }
                continue;
            }

            tracing::debug!(job_id = %job.job_id, targets = targets.len(), "targets resolved");
            self.ctx.tables.with_job_mut(&waiting.job_id, |j| j.assign_targets(targets.clone()));
            for identity in targets {
                self.queues.entry(identity).or_default().push_back(waiting.job_id.clone());
            }
        }
        self.untargeted = still_waiting;
    }

    fn advance_queues(&mut self) {
        let identities: Vec<Identity> = self.queues.keys().cloned().collect();
        for identity in identities {
            self.advance_one(&identity);
        }
        self.queues.retain(|_, queue| !queue.is_empty());
    }

    fn advance_one(&mut self, identity: &Identity) {
        loop {
            let Some(queue) = self.queues.get_mut(identity) else {
                return;
            };
            let Some(head) = queue.front().cloned() else {
                return;
            };
            let Some(job) = self.ctx.tables.job(&head) else {
                queue.pop_front();
                continue;
            };
            if job.is_terminal()
                || job.per_node.get(identity).is_some_and(|r| r.state.is_terminal())
            {
                queue.pop_front();
                continue;
            }

            let gate_key = (identity.clone(), job.parent_id.clone());
            if job.ordered() {
                if let Some(in_flight) = self.gates.get(&gate_key) {
                    if in_flight == &head {
                        // Head already dispatched and still in flight
                        return;
                    }
                    let blocked = self
                        .ctx
                        .tables
                        .job(in_flight)
                        .is_some_and(|prev| !prev.terminal_for(identity));
                    if blocked {
                        return;
                    }
                    self.gates.remove(&gate_key);
                }
                self.gates.insert(gate_key.clone(), head.clone());
            }

            queue.pop_front();
            if !self.dispatch(identity, head.clone()) {
                // Lane congested; revert and retry on the next pass
                if job.ordered() {
                    self.gates.remove(&gate_key);
                }
                if let Some(queue) = self.queues.get_mut(identity) {
                    queue.push_front(head);
                }
                return;
            }
        }
    }

    /// Hand one job to the identity's lane, creating the lane on first
    /// use. Lanes preserve FIFO order per identity and run concurrently
    /// across identities.
    fn dispatch(&mut self, identity: &Identity, job_id: String) -> bool {
        let lane = self.lanes.entry(identity.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::channel(LANE_DEPTH);
            tokio::spawn(lane_task(Arc::clone(&self.ctx), identity.clone(), rx));
            tx
        });
        match lane.try_send(job_id.clone()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%identity, %job_id, error = %e, "lane busy, requeueing");
                false
            }
        }
    }

    /// Record TIMEDOUT for identities that have not replied by the
    /// job's deadline (timeout plus network slack).
    fn expire_overdue(&mut self) {
        let now_ms = self.ctx.now_ms();
        let mut expired = false;
        for job in self.ctx.tables.jobs_snapshot() {
            if job.is_terminal() {
                continue;
            }
            let Some(transmitted) = job.transmitted_at_ms else {
                continue;
            };
            let deadline =
                transmitted + job.timeout_seconds() * 1_000 + NETWORK_SLACK.as_millis() as u64;
            if now_ms >= deadline {
                tracing::warn!(job_id = %job.job_id, verb = %job.verb, "job deadline passed");
                self.ctx.tables.with_job_mut(&job.job_id, |j| j.expire_missing(now_ms));
                expired = true;
            }
        }
        if expired {
            // Expired jobs may free ordered queues behind them
            self.ctx.dispatch_wake.notify_one();
        }
    }
}

/// Explicit targets (or every alive identity), intersected with the
/// restrict list, deduplicated, intersected with the alive set.
fn resolve(job: &Job, alive: &[Identity]) -> Vec<Identity> {
    let mut targets: Vec<Identity> = match job.targets() {
        Some(explicit) => explicit.into_iter().filter(|t| alive.contains(t)).collect(),
        None => alive.to_vec(),
    };
    if let Some(restrict) = job.restrict() {
        targets.retain(|t| restrict.contains(t));
    }
    targets.dedup();
    targets
}

/// Per-identity sender: marks transmission, emits the job frame with
/// retry, and records a NACK when delivery is exhausted.
async fn lane_task(ctx: Arc<ServerCtx>, identity: Identity, mut rx: mpsc::Receiver<String>) {
    while let Some(job_id) = rx.recv().await {
        let Some(job) = ctx.tables.job(&job_id) else {
            continue;
        };
        if job.is_terminal() {
            continue;
        }
        ctx.tables.with_job_mut(&job_id, |j| j.record_transmitted(ctx.clock.epoch_ms()));

        let data = match serde_json::to_value(&job) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(%job_id, error = %e, "job serialize failed");
                continue;
            }
        };
        let frame = Frame::new(&job.verb)
            .with_identity(identity.as_str())
            .with_job_sha(&job.job_sha)
            .with_data(data);

        tracing::info!(job_id = %job_id, %identity, verb = %job.verb, "dispatching");
        if let Err(e) = send_with_retry(ctx.driver.as_ref(), Channel::Job, &identity, frame).await
        {
            tracing::warn!(job_id = %job_id, %identity, error = %e, "dispatch undeliverable");
            let now_ms = ctx.clock.epoch_ms();
            ctx.tables.with_job_mut(&job_id, |j| {
                j.apply_result(
                    &identity,
                    NodeResult {
                        state: JobState::Nacked,
                        stdout: String::new(),
                        stderr: String::new(),
                        info: format!("undeliverable: {e}"),
                        success: Some(false),
                        execution_seconds: 0.0,
                        roundtrip_seconds: 0.0,
                    },
                    now_ms,
                )
            });
            ctx.dispatch_wake.notify_one();
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
