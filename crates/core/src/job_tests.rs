// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

fn map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(m) => m,
        other => panic!("expected object, got {other}"),
    }
}

fn success_result() -> NodeResult {
    NodeResult {
        state: JobState::Succeeded,
        stdout: "ok\n".to_string(),
        stderr: String::new(),
        info: String::new(),
        success: Some(true),
        execution_seconds: 0.5,
        roundtrip_seconds: 0.7,
    }
}

fn failed_result() -> NodeResult {
    NodeResult { state: JobState::Failed, success: Some(false), ..success_result() }
}

#[parameterized(
    pending = { JobState::Pending, false },
    dispatched = { JobState::Dispatched, false },
    running = { JobState::Running, false },
    succeeded = { JobState::Succeeded, true },
    failed = { JobState::Failed, true },
    timedout = { JobState::Timedout, true },
    nacked = { JobState::Nacked, true },
)]
fn terminality(state: JobState, terminal: bool) {
    assert_eq!(state.is_terminal(), terminal);
}

#[test]
fn new_job_defaults_parent_to_job_id() {
    let job = Job::new("RUN", map(json!({"command": "true"})), None, false, 100);
    assert_eq!(job.parent_id, job.job_id);
    assert_eq!(job.state, JobState::Pending);
    assert_eq!(job.timeout_seconds(), crate::consts::DEFAULT_JOB_TIMEOUT_SECS);
}

#[test]
fn common_fields_come_from_the_definition() {
    let job = Job::new(
        "RUN",
        map(json!({
            "command": "true",
            "timeout_seconds": 30,
            "run_once": true,
            "skip_cache": true,
            "stdout_arg": "result",
            "targets": ["n1", "n2"],
            "restrict": ["n2"],
        })),
        None,
        false,
        100,
    );
    assert_eq!(job.timeout_seconds(), 30);
    assert!(job.run_once());
    assert!(job.skip_cache());
    assert_eq!(job.stdout_arg(), Some("result"));
    assert_eq!(job.targets(), Some(vec!["n1".into(), "n2".into()]));
    assert_eq!(job.restrict(), Some(vec!["n2".into()]));
}

#[test]
fn aggregate_succeeds_when_all_nodes_succeed() {
    let mut job = Job::new("RUN", map(json!({"command": "true"})), None, false, 100);
    job.assign_targets(vec!["n1".into(), "n2".into()]);
    job.record_transmitted(150);

    job.apply_result(&"n1".into(), success_result(), 200);
    assert_eq!(job.state, JobState::Dispatched);

    job.apply_result(&"n2".into(), success_result(), 210);
    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.returned_at_ms, Some(210));
}

#[test]
fn aggregate_fails_when_any_node_fails() {
    let mut job = Job::new("RUN", map(json!({"command": "false"})), None, false, 100);
    job.assign_targets(vec!["n1".into(), "n2".into()]);
    job.apply_result(&"n1".into(), success_result(), 200);
    job.apply_result(&"n2".into(), failed_result(), 220);
    assert_eq!(job.state, JobState::Failed);
}

#[test]
fn timeout_takes_precedence_over_plain_failure() {
    let mut job = Job::new("RUN", map(json!({"command": "sleep 99"})), None, false, 100);
    job.assign_targets(vec!["n1".into(), "n2".into()]);
    job.apply_result(&"n1".into(), failed_result(), 200);
    job.expire_missing(700_100);
    assert_eq!(job.per_node[&Identity::from("n2")].state, JobState::Timedout);
    assert_eq!(job.state, JobState::Timedout);
}

#[test]
fn duplicate_return_never_downgrades_terminal_state() {
    let mut job = Job::new("RUN", map(json!({"command": "true"})), None, false, 100);
    job.assign_targets(vec!["n1".into()]);
    job.apply_result(&"n1".into(), success_result(), 200);
    assert_eq!(job.state, JobState::Succeeded);

    let mut running = success_result();
    running.state = JobState::Running;
    running.success = None;
    job.apply_result(&"n1".into(), running, 300);

    assert_eq!(job.per_node[&Identity::from("n1")].state, JobState::Succeeded);
    assert_eq!(job.state, JobState::Succeeded);
}

#[test]
fn terminal_for_treats_unexpected_identities_as_terminal() {
    let mut job = Job::new("RUN", map(json!({"command": "true"})), None, false, 100);
    job.assign_targets(vec!["n1".into()]);
    assert!(!job.terminal_for(&"n1".into()));
    assert!(job.terminal_for(&"n9".into()));
}

#[test]
fn fail_undispatched_records_reason() {
    let mut job = Job::new("RUN", map(json!({"command": "true"})), None, false, 100);
    job.fail_undispatched("no_targets", 5_100);
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.failure_reason.as_deref(), Some("no_targets"));
}

#[test]
fn ordered_respects_async_and_bypass() {
    let sync_job = Job::new("RUN", map(json!({})), None, false, 0);
    assert!(sync_job.ordered());

    let async_job = Job::new("RUN", map(json!({})), None, true, 0);
    assert!(!async_job.ordered());

    let bypass = Job::new("RUN", map(json!({"parent_async_bypass": true})), None, false, 0);
    assert!(!bypass.ordered());
}

#[test]
fn job_serde_roundtrip_is_structural_identity() {
    let mut job = Job::new("RUN", map(json!({"command": "echo hi"})), None, false, 100);
    job.assign_targets(vec!["n1".into()]);
    job.record_transmitted(110);
    job.apply_result(&"n1".into(), success_result(), 200);

    let encoded = serde_json::to_string(&job).expect("serialize");
    let decoded: Job = serde_json::from_str(&encoded).expect("deserialize");

    assert_eq!(decoded.job_id, job.job_id);
    assert_eq!(decoded.job_sha, job.job_sha);
    assert_eq!(decoded.state, job.state);
    assert_eq!(decoded.per_node, job.per_node);
    assert_eq!(decoded.expected, job.expected);
}
