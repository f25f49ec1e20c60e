// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! QUERY: read an argument on every node and spread the answers.
//!
//! Each node answers with its own `args[key]` and a QUERYSTORE callback
//! job. The coordinator fans the callback out (async-gate bypassed), so
//! every node ends up with `query[key][identity] = value` in its query
//! cache.

use crate::{require_str, ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::{Job, JobSpec};
use dird_dsl::ArgSpec;
use dird_store::CacheTag;
use serde_json::{Map, Value};

pub struct Query;

#[async_trait::async_trait]
impl Component for Query {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("key")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let key = require_str(vars, "key")?;
        let mut def = Map::new();
        def.insert("key".to_string(), Value::String(key.to_string()));
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let key = require_str(&job.definition, "key")?;
        let value = ctx.caches.get(CacheTag::Args, key, ctx.now_ms())?.unwrap_or(Value::Null);

        // Record our own answer locally before the fan-out echoes it
        ctx.caches.accumulate_query(key, ctx.identity.as_str(), value.clone(), ctx.now_ms())?;

        let mut vars = Map::new();
        vars.insert("key".to_string(), Value::String(key.to_string()));
        vars.insert("identity".to_string(), Value::String(ctx.identity.to_string()));
        vars.insert("value".to_string(), value.clone());

        let stdout = match &value {
            Value::Null => String::new(),
            Value::String(s) => format!("{s}\n"),
            other => format!("{other}\n"),
        };

        Ok(ComponentOutcome::success()
            .with_stdout(stdout)
            .with_info(format!("query {key}"))
            .with_callback(JobSpec { verb: "QUERYSTORE".to_string(), vars, targets: None }))
    }
}

/// QUERYSTORE: accumulate one node's query answer into the local query
/// cache. Spawned by QUERY's callback; not normally written by hand.
pub struct QueryStore;

#[async_trait::async_trait]
impl Component for QueryStore {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("key").positional("identity").greedy("value")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let key = require_str(vars, "key")?;
        let identity = require_str(vars, "identity")?;
        let mut def = Map::new();
        def.insert("key".to_string(), Value::String(key.to_string()));
        def.insert("identity".to_string(), Value::String(identity.to_string()));
        def.insert("value".to_string(), vars.get("value").cloned().unwrap_or(Value::Null));
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let key = require_str(&job.definition, "key")?;
        let identity = require_str(&job.definition, "identity")?;
        let value = job.definition.get("value").cloned().unwrap_or(Value::Null);
        ctx.caches.accumulate_query(key, identity, value, ctx.now_ms())?;
        Ok(ComponentOutcome::success().with_info(format!("stored query {key} from {identity}")))
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
