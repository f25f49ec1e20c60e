// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios with literal inputs and outputs.

use super::harness::Cluster;
use dird_core::JobState;
use dird_wire::{Request, Response};
use std::time::Instant;

#[tokio::test]
async fn single_echo_returns_stdout_with_timing() {
    let cluster = Cluster::start(&["nodeA"]).await;

    let parents = cluster.submit_yaml(r#"[{jobs: [{RUN: "echo hello world"}]}]"#).await;
    let jobs = cluster.settle(&parents).await;
    assert_eq!(jobs.len(), 1);

    let detail = cluster.job_detail(&jobs[0].job_id).await;
    assert_eq!(detail.state, JobState::Succeeded);
    assert_eq!(detail.per_node.len(), 1);

    let result = &detail.per_node["nodeA"];
    assert_eq!(result.stdout, "hello world\n");
    assert_eq!(result.success, Some(true));
    assert!(result.execution_seconds > 0.0);
}

#[tokio::test]
async fn fan_out_reaches_every_alive_identity() {
    let cluster = Cluster::start(&["n1", "n2", "n3"]).await;

    let parents = cluster.submit_yaml(r#"[{jobs: [{RUN: "echo x"}]}]"#).await;
    let jobs = cluster.settle(&parents).await;

    let detail = cluster.job_detail(&jobs[0].job_id).await;
    assert_eq!(detail.per_node.len(), 3);
    assert!(detail.per_node.values().all(|r| r.success == Some(true)));
}

#[tokio::test]
async fn targeting_restricts_the_second_stanza() {
    let cluster = Cluster::start(&["n1", "n2", "n3", "n4"]).await;

    let parents = cluster
        .submit_yaml(
            r#"
- jobs:
    - RUN: "echo everywhere"
- targets: [n1, n2, n3]
  jobs:
    - RUN: "echo targeted"
"#,
        )
        .await;
    assert_eq!(parents.len(), 2);
    let jobs = cluster.settle(&parents).await;

    let everywhere =
        jobs.iter().find(|j| j.parent_id == parents[0]).expect("first stanza job");
    let targeted = jobs.iter().find(|j| j.parent_id == parents[1]).expect("second stanza job");

    let detail = cluster.job_detail(&everywhere.job_id).await;
    assert_eq!(detail.per_node.len(), 4);

    let detail = cluster.job_detail(&targeted.job_id).await;
    let mut identities: Vec<&String> = detail.per_node.keys().collect();
    identities.sort();
    assert_eq!(identities, ["n1", "n2", "n3"]);
}

#[tokio::test]
async fn async_orchestrations_overlap_on_one_identity() {
    let cluster = Cluster::start(&["n1"]).await;

    let yaml = r#"
- async: true
  jobs:
    - RUN: "sleep 1"
    - RUN: "sleep 1 && true"
    - RUN: "sleep 1 && :"
    - RUN: "sleep 1 # a"
    - RUN: "sleep 1 # b"
    - RUN: "sleep 1 # c"
    - RUN: "sleep 1 # d"
    - RUN: "sleep 1 # e"
    - RUN: "sleep 1 # f"
    - RUN: "sleep 1 # g"
"#;
    let started = Instant::now();
    let parents = cluster.submit_yaml(yaml).await;
    let jobs = cluster.settle(&parents).await;
    let elapsed = started.elapsed();

    assert_eq!(jobs.len(), 10);
    assert!(jobs.iter().all(|j| j.state == JobState::Succeeded));
    // Ten one-second sleeps overlapping: wall-clock stays far under 10s
    assert!(elapsed.as_secs_f64() < 6.0, "async orchestration took {elapsed:?}");

    let Response::ParentAnalysis { report } =
        cluster.request(Request::AnalyzeParent { id: parents[0].clone() }).await
    else {
        panic!("expected ParentAnalysis");
    };
    assert_eq!(report.total_jobs, 10);
    assert_eq!(report.total_successes, 10);
    assert!(report.combined_execution_seconds >= 9.0);
    assert!(report.actual_runtime_seconds < 6.0);
}

#[tokio::test]
async fn timeouts_report_timedout_with_bounded_execution() {
    let cluster = Cluster::start(&["n1"]).await;

    let parents = cluster
        .submit_yaml(
            r#"
- jobs:
    - RUN:
        vars:
          command: sleep 10
          timeout: 1
"#,
        )
        .await;
    let jobs = cluster.settle(&parents).await;

    assert_eq!(jobs[0].state, JobState::Timedout);
    let detail = cluster.job_detail(&jobs[0].job_id).await;
    let result = &detail.per_node["n1"];
    assert_eq!(result.state, JobState::Timedout);
    assert_eq!(result.success, Some(false));
    assert!(result.execution_seconds >= 1.0, "cut off early: {}", result.execution_seconds);
    assert!(result.execution_seconds < 8.0, "ran too long: {}", result.execution_seconds);
}

#[tokio::test]
async fn timestamps_are_monotonic_per_job() {
    let cluster = Cluster::start(&["n1"]).await;

    let parents = cluster.submit_yaml(r#"[{jobs: [{RUN: "echo t"}]}]"#).await;
    let jobs = cluster.settle(&parents).await;

    let detail = cluster.job_detail(&jobs[0].job_id).await;
    let transmitted = detail.transmitted_at_ms.expect("transmitted");
    let returned = detail.returned_at_ms.expect("returned");
    assert!(detail.created_at_ms <= transmitted);
    assert!(transmitted <= returned);
}

#[tokio::test]
async fn purge_jobs_leaves_worker_records() {
    let cluster = Cluster::start(&["n1"]).await;
    let parents = cluster.submit_yaml(r#"[{jobs: [{RUN: "echo x"}]}]"#).await;
    cluster.settle(&parents).await;

    let Response::Purged { count } = cluster.request(Request::PurgeJobs).await else {
        panic!("expected Purged");
    };
    assert_eq!(count, 1);

    let Response::Jobs { jobs } = cluster.request(Request::ListJobs).await else {
        panic!("expected Jobs");
    };
    assert!(jobs.is_empty());

    let Response::Nodes { nodes } = cluster.request(Request::ListNodes).await else {
        panic!("expected Nodes");
    };
    assert_eq!(nodes.len(), 1);
}
