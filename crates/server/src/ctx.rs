// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared coordinator context.

use crate::tables::Tables;
use dird_components::Registry;
use dird_core::DynClock;
use dird_driver::Driver;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// State every coordinator task shares.
pub struct ServerCtx {
    pub tables: Arc<Tables>,
    pub driver: Arc<dyn Driver>,
    pub clock: Arc<dyn DynClock>,
    pub registry: Arc<Registry>,
    /// Submissions headed for the dispatcher
    pub submit_tx: mpsc::Sender<Vec<dird_core::Job>>,
    /// Kicks the dispatcher to re-scan its queues
    pub dispatch_wake: Arc<Notify>,
    /// Trips on shutdown request
    pub shutdown: Arc<Notify>,
}

impl ServerCtx {
    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Hand jobs to the dispatcher.
    pub async fn submit(&self, jobs: Vec<dird_core::Job>) {
        for job in &jobs {
            tracing::info!(
                job_id = %job.job_id,
                parent_id = %job.parent_id,
                verb = %job.verb,
                job_sha = %job.job_sha,
                "job accepted"
            );
            self.tables.insert_job(job.clone());
        }
        if self.submit_tx.send(jobs).await.is_err() {
            tracing::error!("dispatcher is gone; submission dropped");
        }
        self.dispatch_wake.notify_one();
    }
}
