// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! QUERY_WAIT and JOB_WAIT: poll the local caches until a condition
//! appears or the job's timeout cancels the wait.
//!
//! There is no implicit cross-job dependency in orchestrations;
//! operators sequence on data with these verbs instead.

use crate::{require_str, ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::Job;
use dird_dsl::ArgSpec;
use dird_store::CacheTag;
use serde_json::{Map, Value};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// QUERY_WAIT: block until `query[key]` holds an answer (optionally
/// from a specific identity).
pub struct QueryWait;

#[async_trait::async_trait]
impl Component for QueryWait {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("key").optional("identity")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let key = require_str(vars, "key")?;
        let mut def = Map::new();
        def.insert("key".to_string(), Value::String(key.to_string()));
        if let Some(identity) = vars.get("identity").and_then(Value::as_str) {
            def.insert("identity".to_string(), Value::String(identity.to_string()));
        }
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let key = require_str(&job.definition, "key")?;
        let wanted = job.definition.get("identity").and_then(Value::as_str);

        loop {
            if let Some(found) = lookup(ctx, key, wanted)? {
                return Ok(ComponentOutcome::success()
                    .with_stdout(format!("{found}\n"))
                    .with_info(format!("query {key} satisfied")));
            }
            tokio::select! {
                () = tokio::time::sleep(POLL_INTERVAL) => {}
                () = ctx.cancel.cancelled() => return Err(ComponentError::Cancelled),
            }
        }
    }
}

fn lookup(
    ctx: &ClientCtx,
    key: &str,
    wanted: Option<&str>,
) -> Result<Option<Value>, ComponentError> {
    let Some(Value::Object(answers)) = ctx.caches.get(CacheTag::Query, key, ctx.now_ms())? else {
        return Ok(None);
    };
    match wanted {
        Some(identity) => Ok(answers.get(identity).cloned()),
        None if answers.is_empty() => Ok(None),
        None => Ok(Some(Value::Object(answers))),
    }
}

/// JOB_WAIT: block until the jobs cache holds an outcome for a
/// fingerprint, i.e. this node has finished that job at least once.
pub struct JobWait;

#[async_trait::async_trait]
impl Component for JobWait {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("job_sha")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let sha = require_str(vars, "job_sha")?;
        let mut def = Map::new();
        def.insert("job_sha".to_string(), Value::String(sha.to_string()));
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let sha = require_str(&job.definition, "job_sha")?;
        loop {
            if let Some(outcome) = ctx.caches.get(CacheTag::Jobs, sha, ctx.now_ms())? {
                let success =
                    outcome.get("success").and_then(Value::as_bool).unwrap_or(false);
                return Ok(ComponentOutcome {
                    stdout: String::new(),
                    stderr: String::new(),
                    success,
                    info: format!("job {sha} finished"),
                    callbacks: Vec::new(),
                });
            }
            tokio::select! {
                () = tokio::time::sleep(POLL_INTERVAL) => {}
                () = ctx.cancel.cancelled() => return Err(ComponentError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
#[path = "waiters_tests.rs"]
mod tests;
