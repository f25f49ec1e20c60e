// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn query_job(key: &str) -> Job {
    let mut vars = Map::new();
    vars.insert("key".to_string(), json!(key));
    let definition = Query.server(&[], &vars).unwrap();
    Job::new("QUERY", definition, None, false, 0)
}

#[tokio::test]
async fn query_answers_with_the_cached_arg_and_a_callback() {
    let ctx = ClientCtx::for_tests("n1");
    ctx.caches.put(CacheTag::Args, "region", json!("us-east"), 0).unwrap();

    let outcome = Query.client(&ctx, &query_job("region")).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.stdout, "us-east\n");
    assert_eq!(outcome.callbacks.len(), 1);

    let callback = &outcome.callbacks[0];
    assert_eq!(callback.verb, "QUERYSTORE");
    assert_eq!(callback.vars["key"], json!("region"));
    assert_eq!(callback.vars["identity"], json!("n1"));
    assert_eq!(callback.vars["value"], json!("us-east"));
    assert_eq!(callback.targets, None);
}

#[tokio::test]
async fn query_of_a_missing_arg_answers_null() {
    let ctx = ClientCtx::for_tests("n1");
    let outcome = Query.client(&ctx, &query_job("absent")).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.stdout, "");
    assert_eq!(outcome.callbacks[0].vars["value"], Value::Null);
}

#[tokio::test]
async fn query_records_its_own_answer_locally() {
    let ctx = ClientCtx::for_tests("n1");
    ctx.caches.put(CacheTag::Args, "region", json!("eu"), 0).unwrap();
    Query.client(&ctx, &query_job("region")).await.unwrap();

    let answers = ctx.caches.get(CacheTag::Query, "region", 1).unwrap();
    assert_eq!(answers, Some(json!({"n1": "eu"})));
}

#[tokio::test]
async fn querystore_accumulates_answers_from_other_nodes() {
    let ctx = ClientCtx::for_tests("n1");

    for (identity, value) in [("n2", "eu"), ("n3", "ap")] {
        let mut vars = Map::new();
        vars.insert("key".to_string(), json!("region"));
        vars.insert("identity".to_string(), json!(identity));
        vars.insert("value".to_string(), json!(value));
        let definition = QueryStore.server(&[], &vars).unwrap();
        let job = Job::new("QUERYSTORE", definition, None, false, 0);
        QueryStore.client(&ctx, &job).await.unwrap();
    }

    let answers = ctx.caches.get(CacheTag::Query, "region", 1).unwrap();
    assert_eq!(answers, Some(json!({"n2": "eu", "n3": "ap"})));
}
