// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory worker and job tables with write-through persistence.
//!
//! Per-table locks; writers stay short-lived and never do I/O while
//! holding a lock on the other table.

use dird_core::{Heartbeat, Identity, Job, WorkerRecord};
use dird_store::{Datastore, StoreError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const WORKER_TABLE: &str = "workers";
const JOB_TABLE: &str = "jobs";

pub struct Tables {
    store: Arc<dyn Datastore>,
    workers: Mutex<HashMap<Identity, WorkerRecord>>,
    jobs: Mutex<HashMap<String, Job>>,
}

impl Tables {
    /// Load persisted state from the datastore.
    pub fn load(store: Arc<dyn Datastore>) -> Result<Self, StoreError> {
        let mut workers = HashMap::new();
        for (key, value) in store.scan(WORKER_TABLE, None)? {
            match serde_json::from_value::<WorkerRecord>(value) {
                Ok(record) => {
                    workers.insert(record.identity.clone(), record);
                }
                Err(e) => tracing::warn!(%key, error = %e, "skipping unreadable worker record"),
            }
        }
        let mut jobs = HashMap::new();
        for (key, value) in store.scan(JOB_TABLE, None)? {
            match serde_json::from_value::<Job>(value) {
                Ok(job) => {
                    jobs.insert(job.job_id.clone(), job);
                }
                Err(e) => tracing::warn!(%key, error = %e, "skipping unreadable job record"),
            }
        }
        tracing::info!(workers = workers.len(), jobs = jobs.len(), "tables loaded");
        Ok(Self { store, workers: Mutex::new(workers), jobs: Mutex::new(jobs) })
    }

    // --- workers ---

    /// Upsert a worker from a heartbeat, refreshing its expiry deadline.
    pub fn observe_heartbeat(&self, identity: Identity, beat: Heartbeat, now_ms: u64) {
        let record = {
            let mut workers = self.workers.lock();
            match workers.get_mut(&identity) {
                Some(record) => {
                    record.observe(beat, now_ms);
                    record.clone()
                }
                None => {
                    let record = WorkerRecord::from_heartbeat(identity.clone(), beat, now_ms);
                    workers.insert(identity, record.clone());
                    record
                }
            }
        };
        self.persist_worker(&record);
    }

    pub fn workers_snapshot(&self) -> Vec<WorkerRecord> {
        self.workers.lock().values().cloned().collect()
    }

    /// Identities currently alive, the dispatch candidates.
    pub fn alive_identities(&self, now_ms: u64) -> Vec<Identity> {
        let mut alive: Vec<Identity> = self
            .workers
            .lock()
            .values()
            .filter(|r| r.is_alive(now_ms))
            .map(|r| r.identity.clone())
            .collect();
        alive.sort();
        alive
    }

    /// Drop every worker record. Jobs are untouched.
    pub fn purge_nodes(&self) -> usize {
        let drained: Vec<Identity> = {
            let mut workers = self.workers.lock();
            let keys: Vec<Identity> = workers.keys().cloned().collect();
            workers.clear();
            keys
        };
        for identity in &drained {
            if let Err(e) = self.store.delete(WORKER_TABLE, identity.as_str()) {
                tracing::warn!(%identity, error = %e, "failed to delete worker record");
            }
        }
        drained.len()
    }

    // --- jobs ---

    pub fn insert_job(&self, job: Job) {
        self.persist_job(&job);
        self.jobs.lock().insert(job.job_id.clone(), job);
    }

    pub fn job(&self, job_id: &str) -> Option<Job> {
        self.jobs.lock().get(job_id).cloned()
    }

    /// Find a job by id or unique prefix (like git commit hashes).
    pub fn job_by_prefix(&self, prefix: &str) -> Option<Job> {
        let jobs = self.jobs.lock();
        if let Some(job) = jobs.get(prefix) {
            return Some(job.clone());
        }
        let mut matches = jobs.values().filter(|j| j.job_id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(job), None) => Some(job.clone()),
            _ => None,
        }
    }

    pub fn jobs_snapshot(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.lock().values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms));
        jobs
    }

    pub fn jobs_for_parent(&self, parent_id: &str) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .lock()
            .values()
            .filter(|j| j.parent_id == parent_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms));
        jobs
    }

    /// Mutate one job under the lock, then persist the result.
    /// Returns None when the job does not exist.
    pub fn with_job_mut<T>(&self, job_id: &str, f: impl FnOnce(&mut Job) -> T) -> Option<T> {
        let (result, job) = {
            let mut jobs = self.jobs.lock();
            let job = jobs.get_mut(job_id)?;
            let result = f(job);
            (result, job.clone())
        };
        self.persist_job(&job);
        Some(result)
    }

    /// Drop every job record. Worker records are untouched.
    pub fn purge_jobs(&self) -> usize {
        let drained: Vec<String> = {
            let mut jobs = self.jobs.lock();
            let keys: Vec<String> = jobs.keys().cloned().collect();
            jobs.clear();
            keys
        };
        for job_id in &drained {
            if let Err(e) = self.store.delete(JOB_TABLE, job_id) {
                tracing::warn!(%job_id, error = %e, "failed to delete job record");
            }
        }
        drained.len()
    }

    fn persist_worker(&self, record: &WorkerRecord) {
        match serde_json::to_value(record) {
            Ok(value) => {
                if let Err(e) = self.store.put(WORKER_TABLE, record.identity.as_str(), value) {
                    tracing::warn!(identity = %record.identity, error = %e, "worker persist failed");
                }
            }
            Err(e) => tracing::error!(error = %e, "worker serialize failed"),
        }
    }

    fn persist_job(&self, job: &Job) {
        match serde_json::to_value(job) {
            Ok(value) => {
                if let Err(e) = self.store.put(JOB_TABLE, &job.job_id, value) {
                    tracing::warn!(job_id = %job.job_id, error = %e, "job persist failed");
                }
            }
            Err(e) => tracing::error!(error = %e, "job serialize failed"),
        }
    }
}

#[cfg(test)]
#[path = "tables_tests.rs"]
mod tests;
