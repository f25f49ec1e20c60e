// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job records: the immutable submission unit and its per-node results.

use crate::fingerprint;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// State of a job, both in aggregate and per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, not yet sent to any identity
    Pending,
    /// Sent to at least one identity
    Dispatched,
    /// A node reported execution in progress
    Running,
    /// Every expected node succeeded
    Succeeded,
    /// At least one expected node failed
    Failed,
    /// At least one expected node exceeded its timeout
    Timedout,
    /// The transport gave up delivering after retry exhaustion
    Nacked,
}

impl JobState {
    /// Terminal states never regress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Timedout | JobState::Nacked
        )
    }
}

crate::simple_display! {
    JobState {
        Pending => "PENDING",
        Dispatched => "DISPATCHED",
        Running => "RUNNING",
        Succeeded => "SUCCEEDED",
        Failed => "FAILED",
        Timedout => "TIMEDOUT",
        Nacked => "NACKED",
    }
}

/// Outcome reported by one identity for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub state: JobState,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub info: String,
    /// None until the node reports; Some once a verdict exists
    #[serde(default)]
    pub success: Option<bool>,
    /// Wall-clock execution time measured on the client
    #[serde(default)]
    pub execution_seconds: f64,
    /// Dispatch-to-return time measured on the server
    #[serde(default)]
    pub roundtrip_seconds: f64,
}

impl NodeResult {
    /// A placeholder result for a node that has not replied yet.
    pub fn pending() -> Self {
        Self {
            state: JobState::Dispatched,
            stdout: String::new(),
            stderr: String::new(),
            info: String::new(),
            success: None,
            execution_seconds: 0.0,
            roundtrip_seconds: 0.0,
        }
    }

    /// Merge a (possibly duplicate) incoming result.
    ///
    /// Last writer wins, except that a terminal result is never replaced
    /// by a non-terminal one. Replaying a duplicate return frame can
    /// therefore never downgrade a settled outcome.
    pub fn merge(&mut self, incoming: NodeResult) {
        if self.state.is_terminal() && !incoming.state.is_terminal() {
            return;
        }
        *self = incoming;
    }
}

/// A submission unit: one verb plus its argument map.
///
/// Produced by the orchestration compiler and by components spawning
/// callback jobs. Expanded into a [`Job`] by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub verb: String,
    #[serde(default)]
    pub vars: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
}

/// Structured payload of a return-channel frame; display text rides in
/// the frame's stdout/stderr/info fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPayload {
    pub job_id: String,
    /// Running for interim notices, terminal for final results
    pub state: JobState,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub execution_seconds: f64,
    /// Follow-up jobs the component spawned
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<JobSpec>,
}

/// An immutable execution request, fan-out-expanded to one result per
/// identity at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    /// Orchestration this job belongs to; equals `job_id` for one-shot execs
    pub parent_id: String,
    /// Component name, uppercase
    pub verb: String,
    /// Content fingerprint over the canonical definition
    pub job_sha: String,
    /// Verb-specific fields plus the common fields (timeout_seconds,
    /// skip_cache, run_once, targets, restrict, extend_args, stdout_arg,
    /// parent_async_bypass)
    pub definition: Map<String, Value>,
    /// True when the owning orchestration declared `async: true`
    #[serde(default)]
    pub parent_async: bool,
    pub created_at_ms: u64,
    #[serde(default)]
    pub transmitted_at_ms: Option<u64>,
    #[serde(default)]
    pub returned_at_ms: Option<u64>,
    pub state: JobState,
    /// Reason for a dispatch-side failure, e.g. `no_targets`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Identities resolved at dispatch; the job is terminal once each has
    /// a terminal result
    #[serde(default)]
    pub expected: Vec<Identity>,
    #[serde(default)]
    pub per_node: HashMap<Identity, NodeResult>,
}

impl Job {
    /// Create a pending job from a spec, fingerprinting the definition.
    pub fn new(
        verb: impl Into<String>,
        definition: Map<String, Value>,
        parent_id: Option<String>,
        parent_async: bool,
        now_ms: u64,
    ) -> Self {
        let verb = verb.into();
        let job_id = uuid::Uuid::new_v4().to_string();
        let parent_id = parent_id.unwrap_or_else(|| job_id.clone());
        let job_sha = fingerprint::job_sha(&verb, &definition);
        Self {
            job_id,
            parent_id,
            verb,
            job_sha,
            definition,
            parent_async,
            created_at_ms: now_ms,
            transmitted_at_ms: None,
            returned_at_ms: None,
            state: JobState::Pending,
            failure_reason: None,
            expected: Vec::new(),
            per_node: HashMap::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the ordering gate applies: synchronous parent, no bypass.
    pub fn ordered(&self) -> bool {
        !self.parent_async && !self.parent_async_bypass()
    }

    // --- common definition fields ---

    pub fn timeout_seconds(&self) -> u64 {
        self.u64_field("timeout_seconds")
            .or_else(|| self.u64_field("timeout"))
            .unwrap_or(crate::consts::DEFAULT_JOB_TIMEOUT_SECS)
    }

    pub fn run_once(&self) -> bool {
        self.bool_field("run_once")
    }

    pub fn skip_cache(&self) -> bool {
        self.bool_field("skip_cache")
    }

    pub fn parent_async_bypass(&self) -> bool {
        self.bool_field("parent_async_bypass")
    }

    /// Opt-in to the executor's bounded parallel pool.
    pub fn no_block(&self) -> bool {
        self.bool_field("no_block")
    }

    pub fn stdout_arg(&self) -> Option<&str> {
        self.definition.get("stdout_arg").and_then(Value::as_str)
    }

    /// Explicit target identities from the definition, if any.
    pub fn targets(&self) -> Option<Vec<Identity>> {
        self.string_list("targets").map(|v| v.into_iter().map(Identity::from).collect())
    }

    /// Identities the job is restricted to, if any.
    pub fn restrict(&self) -> Option<Vec<Identity>> {
        self.string_list("restrict").map(|v| v.into_iter().map(Identity::from).collect())
    }

    fn bool_field(&self, name: &str) -> bool {
        self.definition.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    fn u64_field(&self, name: &str) -> Option<u64> {
        self.definition.get(name).and_then(Value::as_u64)
    }

    fn string_list(&self, name: &str) -> Option<Vec<String>> {
        let items = self.definition.get(name)?.as_array()?;
        Some(items.iter().filter_map(Value::as_str).map(str::to_string).collect())
    }

    // --- lifecycle mutations (coordinator side) ---

    /// Record the resolved target set and seed pending per-node slots.
    pub fn assign_targets(&mut self, targets: Vec<Identity>) {
        for identity in &targets {
            self.per_node.entry(identity.clone()).or_insert_with(NodeResult::pending);
        }
        self.expected = targets;
    }

    /// Record the first transmission. Later fan-out sends keep the
    /// original timestamp so roundtrip accounting has one anchor.
    pub fn record_transmitted(&mut self, now_ms: u64) {
        if self.transmitted_at_ms.is_none() {
            self.transmitted_at_ms = Some(now_ms);
        }
        if self.state == JobState::Pending {
            self.state = JobState::Dispatched;
        }
    }

    /// Fail the job before dispatch (e.g. no live targets after grace).
    pub fn fail_undispatched(&mut self, reason: impl Into<String>, now_ms: u64) {
        self.state = JobState::Failed;
        self.failure_reason = Some(reason.into());
        self.returned_at_ms = Some(now_ms);
    }

    /// Merge a node's result and recompute the aggregate state.
    ///
    /// Results are accepted for identities that were expected at dispatch
    /// or that appear before the job goes terminal.
    pub fn apply_result(&mut self, identity: &Identity, result: NodeResult, now_ms: u64) {
        if self.is_terminal() && !self.per_node.contains_key(identity) {
            return;
        }
        self.per_node.entry(identity.clone()).or_insert_with(NodeResult::pending).merge(result);
        if !self.expected.contains(identity) {
            self.expected.push(identity.clone());
        }
        self.returned_at_ms = Some(self.returned_at_ms.map_or(now_ms, |t| t.max(now_ms)));
        self.recompute_state();
    }

    /// Mark every expected identity without a terminal result as timed out.
    pub fn expire_missing(&mut self, now_ms: u64) {
        for identity in &self.expected {
            let slot = self.per_node.entry(identity.clone()).or_insert_with(NodeResult::pending);
            if !slot.state.is_terminal() {
                slot.state = JobState::Timedout;
                slot.success = Some(false);
                slot.info = "timed out waiting for a result".to_string();
            }
        }
        self.returned_at_ms = Some(self.returned_at_ms.map_or(now_ms, |t| t.max(now_ms)));
        self.recompute_state();
    }

    /// Whether a specific identity has reached a terminal result.
    ///
    /// Identities outside the expected set count as trivially terminal,
    /// which is what the ordering gate needs for restricted-out nodes.
    pub fn terminal_for(&self, identity: &Identity) -> bool {
        if self.is_terminal() {
            return true;
        }
        if !self.expected.contains(identity) {
            return true;
        }
        self.per_node.get(identity).is_some_and(|r| r.state.is_terminal())
    }

    fn recompute_state(&mut self) {
        if self.expected.is_empty() {
            return;
        }
        let all_terminal = self
            .expected
            .iter()
            .all(|id| self.per_node.get(id).is_some_and(|r| r.state.is_terminal()));
        if !all_terminal {
            if self.per_node.values().any(|r| r.state == JobState::Running)
                && !self.state.is_terminal()
            {
                self.state = JobState::Running;
            }
            return;
        }
        let results: Vec<&NodeResult> =
            self.expected.iter().filter_map(|id| self.per_node.get(id)).collect();
        self.state = if results.iter().all(|r| r.success == Some(true)) {
            JobState::Succeeded
        } else if results.iter().any(|r| r.state == JobState::Timedout) {
            JobState::Timedout
        } else if results.iter().any(|r| r.state == JobState::Nacked) {
            JobState::Nacked
        } else {
            JobState::Failed
        };
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            job_id: String = "job-1",
            parent_id: String = "parent-1",
            verb: String = "RUN",
            job_sha: String = "0000",
        }
        set {
            definition: Map<String, Value> = Map::new(),
            parent_async: bool = false,
            created_at_ms: u64 = 1_000,
            transmitted_at_ms: Option<u64> = None,
            returned_at_ms: Option<u64> = None,
            state: JobState = JobState::Pending,
            expected: Vec<Identity> = Vec::new(),
            per_node: HashMap<Identity, NodeResult> = HashMap::new(),
        }
        option {
            failure_reason: String = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
