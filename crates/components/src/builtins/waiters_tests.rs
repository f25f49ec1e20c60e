// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn query_wait_job(key: &str, identity: Option<&str>) -> Job {
    let mut vars = Map::new();
    vars.insert("key".to_string(), json!(key));
    if let Some(identity) = identity {
        vars.insert("identity".to_string(), json!(identity));
    }
    let definition = QueryWait.server(&[], &vars).unwrap();
    Job::new("QUERY_WAIT", definition, None, false, 0)
}

fn job_wait_job(sha: &str) -> Job {
    let mut vars = Map::new();
    vars.insert("job_sha".to_string(), json!(sha));
    let definition = JobWait.server(&[], &vars).unwrap();
    Job::new("JOB_WAIT", definition, None, false, 0)
}

#[tokio::test]
async fn query_wait_returns_once_an_answer_exists() {
    let ctx = ClientCtx::for_tests("n1");
    ctx.caches.accumulate_query("region", "n2", json!("eu"), 0).unwrap();

    let outcome = QueryWait.client(&ctx, &query_wait_job("region", None)).await.unwrap();
    assert!(outcome.success);
    assert!(outcome.stdout.contains("eu"));
}

#[tokio::test]
async fn query_wait_blocks_until_the_answer_arrives() {
    let ctx = ClientCtx::for_tests("n1");
    let caches = ctx.caches.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        caches.accumulate_query("region", "n2", json!("eu"), 0).unwrap();
    });

    let outcome = QueryWait.client(&ctx, &query_wait_job("region", Some("n2"))).await.unwrap();
    assert!(outcome.success);
}

#[tokio::test]
async fn query_wait_for_a_specific_identity_ignores_others() {
    let ctx = ClientCtx::for_tests("n1");
    ctx.caches.accumulate_query("region", "n2", json!("eu"), 0).unwrap();

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        cancel.cancel();
    });

    let result = QueryWait.client(&ctx, &query_wait_job("region", Some("n9"))).await;
    assert!(matches!(result, Err(ComponentError::Cancelled)));
}

#[tokio::test]
async fn job_wait_reflects_the_cached_outcome_success() {
    let ctx = ClientCtx::for_tests("n1");
    ctx.caches.put(CacheTag::Jobs, "sha-ok", json!({"success": true}), 0).unwrap();
    ctx.caches.put(CacheTag::Jobs, "sha-bad", json!({"success": false}), 0).unwrap();

    let ok = JobWait.client(&ctx, &job_wait_job("sha-ok")).await.unwrap();
    assert!(ok.success);

    let bad = JobWait.client(&ctx, &job_wait_job("sha-bad")).await.unwrap();
    assert!(!bad.success);
}

#[tokio::test]
async fn job_wait_cancels_cleanly() {
    let ctx = ClientCtx::for_tests("n1");
    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        cancel.cancel();
    });
    let result = JobWait.client(&ctx, &job_wait_job("never")).await;
    assert!(matches!(result, Err(ComponentError::Cancelled)));
}
