// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job ingest: single consumer of the job channel.
//!
//! Jobs land on an ordered FIFO toward the executor. Duplicates (the
//! job channel tolerates redelivery) are dropped by job id, and jobs
//! whose restrict list excludes this identity are silently ignored.

use dird_core::{Identity, Job};
use dird_driver::{Channel, Driver, DriverError};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Bound on the remembered job ids for deduplication.
const SEEN_CAP: usize = 4_096;

pub async fn ingest_task(
    driver: Arc<dyn Driver>,
    identity: Identity,
    queue_tx: mpsc::Sender<Job>,
) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut seen_order: VecDeque<String> = VecDeque::new();

    loop {
        let frame = match driver.recv(Channel::Job).await {
            Ok((_, frame)) => frame,
            Err(DriverError::Closed) => {
                tracing::debug!("job channel closed");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "job receive error");
                continue;
            }
        };

        let job: Job = match serde_json::from_value(frame.data) {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable job frame");
                continue;
            }
        };

        if seen.contains(&job.job_id) {
            tracing::debug!(job_id = %job.job_id, "duplicate job dropped");
            continue;
        }
        if let Some(restrict) = job.restrict() {
            if !restrict.contains(&identity) {
                // Restricted out: no result, by contract
                tracing::debug!(job_id = %job.job_id, "restricted out, ignoring");
                continue;
            }
        }

        seen.insert(job.job_id.clone());
        seen_order.push_back(job.job_id.clone());
        if seen_order.len() > SEEN_CAP {
            if let Some(old) = seen_order.pop_front() {
                seen.remove(&old);
            }
        }

        tracing::debug!(job_id = %job.job_id, verb = %job.verb, "job queued");
        if queue_tx.send(job).await.is_err() {
            tracing::debug!("executor is gone");
            return;
        }
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
