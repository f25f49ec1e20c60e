// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache-hit behavior: run_once idempotence across submissions.

use super::harness::Cluster;
use dird_core::JobState;

#[tokio::test]
async fn run_once_executes_exactly_once_across_two_submissions() {
    let cluster = Cluster::start(&["n1"]).await;
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran.log");

    // The marker file is the spy: one line per real invocation
    let yaml = format!(
        r#"[{{jobs: [{{RUN: "--run-once echo ran >> {}"}}]}}]"#,
        marker.display()
    );

    let first = cluster.submit_yaml(&yaml).await;
    let jobs = cluster.settle(&first).await;
    assert_eq!(jobs[0].state, JobState::Succeeded);
    let first_detail = cluster.job_detail(&jobs[0].job_id).await;
    assert!(first_detail.per_node["n1"].execution_seconds > 0.0);

    // Byte-identical canonical form: same fingerprint, cached outcome
    let second = cluster.submit_yaml(&yaml).await;
    let jobs = cluster.settle(&second).await;
    assert_eq!(jobs[0].state, JobState::Succeeded);

    let second_detail = cluster.job_detail(&jobs[0].job_id).await;
    assert_eq!(first_detail.job_sha, second_detail.job_sha);
    let result = &second_detail.per_node["n1"];
    assert_eq!(result.info, "cached outcome");
    assert!((result.execution_seconds - 0.0).abs() < f64::EPSILON);

    let lines = std::fs::read_to_string(&marker).unwrap();
    assert_eq!(lines.lines().count(), 1, "component ran more than once");
}

#[tokio::test]
async fn ignore_cache_forces_re_execution() {
    let cluster = Cluster::start(&["n1"]).await;
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran.log");

    let yaml = format!(
        r#"[{{jobs: [{{RUN: "--run-once echo ran >> {}"}}]}}]"#,
        marker.display()
    );

    let first = cluster.submit_yaml(&yaml).await;
    cluster.settle(&first).await;

    let second = cluster.submit_yaml_with(&yaml, Vec::new(), true).await;
    cluster.settle(&second).await;

    let lines = std::fs::read_to_string(&marker).unwrap();
    assert_eq!(lines.lines().count(), 2, "skip_cache submission was served from cache");
}

#[tokio::test]
async fn arg_cache_feeds_later_jobs_on_the_same_node() {
    let cluster = Cluster::start(&["n1"]).await;

    let yaml = r#"
- jobs:
    - ARG: greeting salutations
    - RUN: "echo ${greeting} world"
"#;
    let parents = cluster.submit_yaml(yaml).await;
    let jobs = cluster.settle(&parents).await;
    assert!(jobs.iter().all(|j| j.state == JobState::Succeeded));

    let run = jobs.iter().find(|j| j.verb == "RUN").expect("run job");
    let detail = cluster.job_detail(&run.job_id).await;
    assert_eq!(detail.per_node["n1"].stdout, "salutations world\n");
}

#[tokio::test]
async fn stdout_arg_chains_into_the_next_job() {
    let cluster = Cluster::start(&["n1"]).await;

    let yaml = r#"
- jobs:
    - RUN: "--stdout-arg captured echo first-value"
    - RUN: "echo got ${captured}"
"#;
    let parents = cluster.submit_yaml(yaml).await;
    let jobs = cluster.settle(&parents).await;
    assert!(jobs.iter().all(|j| j.state == JobState::Succeeded), "jobs: {jobs:?}");

    let mut runs: Vec<_> = jobs.iter().collect();
    runs.sort_by_key(|j| j.created_at_ms);
    let detail = cluster.job_detail(&runs[1].job_id).await;
    assert_eq!(detail.per_node["n1"].stdout, "got first-value\n");
}
