// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordering contract: synchronous parents run strictly FIFO per
//! identity; asynchronous parents interleave.

use super::harness::Cluster;
use dird_core::JobState;

#[tokio::test]
async fn sync_parent_executes_in_submission_order() {
    let cluster = Cluster::start(&["n1"]).await;
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("order.log");

    let yaml = format!(
        r#"
- jobs:
    - RUN: "echo 1 >> {log}"
    - RUN: "echo 2 >> {log}"
    - RUN: "echo 3 >> {log}"
    - RUN: "echo 4 >> {log}"
    - RUN: "echo 5 >> {log}"
"#,
        log = log.display()
    );
    let parents = cluster.submit_yaml(&yaml).await;
    let jobs = cluster.settle(&parents).await;
    assert!(jobs.iter().all(|j| j.state == JobState::Succeeded));

    let contents = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines, ["1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn sync_parent_return_times_are_non_decreasing() {
    let cluster = Cluster::start(&["n1"]).await;

    let yaml = r#"
- jobs:
    - RUN: "echo a"
    - RUN: "echo b"
    - RUN: "echo c"
"#;
    let parents = cluster.submit_yaml(yaml).await;
    let mut jobs = cluster.settle(&parents).await;
    jobs.sort_by_key(|j| j.created_at_ms);

    let mut last_returned = 0u64;
    for job in &jobs {
        let detail = cluster.job_detail(&job.job_id).await;
        let returned = detail.returned_at_ms.expect("returned");
        assert!(
            returned >= last_returned,
            "job {} settled before its predecessor",
            job.job_id
        );
        last_returned = returned;
    }
}

#[tokio::test]
async fn independent_parents_interleave_across_identities() {
    let cluster = Cluster::start(&["n1", "n2"]).await;

    // Two single-target stanzas; neither blocks the other
    let yaml = r#"
- targets: [n1]
  jobs:
    - RUN: "sleep 1"
- targets: [n2]
  jobs:
    - RUN: "echo quick"
"#;
    let started = std::time::Instant::now();
    let parents = cluster.submit_yaml(yaml).await;
    let jobs = cluster.settle(&parents).await;

    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|j| j.state == JobState::Succeeded));
    // The n2 stanza must not queue behind n1's sleep
    assert!(started.elapsed().as_secs_f64() < 5.0);
}
