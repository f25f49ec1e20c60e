// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol DTOs derived from coordinator state.

use dird_core::{Job, JobState, NodeResult, WorkerRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One worker row for `list-nodes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeEntry {
    pub identity: String,
    pub alive: bool,
    pub version: String,
    pub last_seen_ms: u64,
    pub expiry_ms: u64,
    pub host_uptime_secs: u64,
    pub agent_uptime_secs: u64,
    #[serde(default)]
    pub components: Vec<String>,
}

impl NodeEntry {
    pub fn from_record(record: &WorkerRecord, now_ms: u64) -> Self {
        Self {
            identity: record.identity.to_string(),
            alive: record.is_alive(now_ms),
            version: record.version.clone(),
            last_seen_ms: record.last_seen_ms,
            expiry_ms: record.expiry_ms,
            host_uptime_secs: record.host_uptime_secs,
            agent_uptime_secs: record.agent_uptime_secs,
            components: record.components.clone(),
        }
    }
}

/// One job row for `list-jobs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    pub job_id: String,
    pub parent_id: String,
    pub verb: String,
    pub job_sha: String,
    pub state: JobState,
    pub created_at_ms: u64,
    pub node_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        let success_count =
            job.per_node.values().filter(|r| r.success == Some(true)).count();
        let failure_count =
            job.per_node.values().filter(|r| r.success == Some(false)).count();
        Self {
            job_id: job.job_id.clone(),
            parent_id: job.parent_id.clone(),
            verb: job.verb.clone(),
            job_sha: job.job_sha.clone(),
            state: job.state,
            created_at_ms: job.created_at_ms,
            node_count: job.per_node.len(),
            success_count,
            failure_count,
        }
    }
}

/// Full job record for `job-info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDetail {
    pub job_id: String,
    pub parent_id: String,
    pub verb: String,
    pub job_sha: String,
    pub state: JobState,
    pub definition: Map<String, Value>,
    pub created_at_ms: u64,
    #[serde(default)]
    pub transmitted_at_ms: Option<u64>,
    #[serde(default)]
    pub returned_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Sorted by identity for stable display
    pub per_node: BTreeMap<String, NodeResult>,
}

impl From<&Job> for JobDetail {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            parent_id: job.parent_id.clone(),
            verb: job.verb.clone(),
            job_sha: job.job_sha.clone(),
            state: job.state,
            definition: job.definition.clone(),
            created_at_ms: job.created_at_ms,
            transmitted_at_ms: job.transmitted_at_ms,
            returned_at_ms: job.returned_at_ms,
            failure_reason: job.failure_reason.clone(),
            per_node: job
                .per_node
                .iter()
                .map(|(identity, result)| (identity.to_string(), result.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
