// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution profiling over finished jobs.

use crate::identity::Identity;
use crate::job::Job;
use serde::{Deserialize, Serialize};

/// One identity with a timing measurement, for fastest/slowest reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTiming {
    pub identity: Identity,
    pub seconds: f64,
}

/// Profile of a single job across its nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    pub job_id: String,
    pub verb: String,
    pub total_node_count: usize,
    pub total_successes: usize,
    pub total_failures: usize,
    pub combined_execution_seconds: f64,
    pub avg_execution_seconds: f64,
    pub fastest_execution: Option<NodeTiming>,
    pub slowest_execution: Option<NodeTiming>,
    pub fastest_roundtrip: Option<NodeTiming>,
    pub slowest_roundtrip: Option<NodeTiming>,
}

/// Profile aggregated across every child job of an orchestration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentAnalysis {
    pub parent_id: String,
    pub total_jobs: usize,
    pub total_node_count: usize,
    pub total_successes: usize,
    pub total_failures: usize,
    /// max(returned_at) − min(created_at) across children
    pub actual_runtime_seconds: f64,
    pub combined_execution_seconds: f64,
    pub avg_execution_seconds: f64,
    pub fastest_execution: Option<NodeTiming>,
    pub slowest_execution: Option<NodeTiming>,
    pub fastest_roundtrip: Option<NodeTiming>,
    pub slowest_roundtrip: Option<NodeTiming>,
}

struct Accumulator {
    node_count: usize,
    successes: usize,
    failures: usize,
    combined_execution: f64,
    fastest_execution: Option<NodeTiming>,
    slowest_execution: Option<NodeTiming>,
    fastest_roundtrip: Option<NodeTiming>,
    slowest_roundtrip: Option<NodeTiming>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            node_count: 0,
            successes: 0,
            failures: 0,
            combined_execution: 0.0,
            fastest_execution: None,
            slowest_execution: None,
            fastest_roundtrip: None,
            slowest_roundtrip: None,
        }
    }

    fn absorb(&mut self, job: &Job) {
        for (identity, result) in &job.per_node {
            self.node_count += 1;
            if result.success == Some(true) {
                self.successes += 1;
            } else {
                self.failures += 1;
            }
            self.combined_execution += result.execution_seconds;

            track_min(&mut self.fastest_execution, identity, result.execution_seconds);
            track_max(&mut self.slowest_execution, identity, result.execution_seconds);
            track_min(&mut self.fastest_roundtrip, identity, result.roundtrip_seconds);
            track_max(&mut self.slowest_roundtrip, identity, result.roundtrip_seconds);
        }
    }

    fn avg(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.combined_execution / self.node_count as f64
        }
    }
}

fn track_min(slot: &mut Option<NodeTiming>, identity: &Identity, seconds: f64) {
    if slot.as_ref().is_none_or(|t| seconds < t.seconds) {
        *slot = Some(NodeTiming { identity: identity.clone(), seconds });
    }
}

fn track_max(slot: &mut Option<NodeTiming>, identity: &Identity, seconds: f64) {
    if slot.as_ref().is_none_or(|t| seconds > t.seconds) {
        *slot = Some(NodeTiming { identity: identity.clone(), seconds });
    }
}

/// Profile one job.
pub fn analyze_job(job: &Job) -> JobAnalysis {
    let mut acc = Accumulator::new();
    acc.absorb(job);
    JobAnalysis {
        job_id: job.job_id.clone(),
        verb: job.verb.clone(),
        total_node_count: acc.node_count,
        total_successes: acc.successes,
        total_failures: acc.failures,
        combined_execution_seconds: acc.combined_execution,
        avg_execution_seconds: acc.avg(),
        fastest_execution: acc.fastest_execution,
        slowest_execution: acc.slowest_execution,
        fastest_roundtrip: acc.fastest_roundtrip,
        slowest_roundtrip: acc.slowest_roundtrip,
    }
}

/// Profile every child job sharing a parent id.
pub fn analyze_parent(parent_id: &str, jobs: &[&Job]) -> ParentAnalysis {
    let mut acc = Accumulator::new();
    for job in jobs {
        acc.absorb(job);
    }

    let earliest_created = jobs.iter().map(|j| j.created_at_ms).min().unwrap_or(0);
    let latest_returned = jobs.iter().filter_map(|j| j.returned_at_ms).max().unwrap_or(0);
    let actual_runtime_seconds =
        latest_returned.saturating_sub(earliest_created) as f64 / 1_000.0;

    ParentAnalysis {
        parent_id: parent_id.to_string(),
        total_jobs: jobs.len(),
        total_node_count: acc.node_count,
        total_successes: acc.successes,
        total_failures: acc.failures,
        actual_runtime_seconds,
        combined_execution_seconds: acc.combined_execution,
        avg_execution_seconds: acc.avg(),
        fastest_execution: acc.fastest_execution,
        slowest_execution: acc.slowest_execution,
        fastest_roundtrip: acc.fastest_roundtrip,
        slowest_roundtrip: acc.slowest_roundtrip,
    }
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
