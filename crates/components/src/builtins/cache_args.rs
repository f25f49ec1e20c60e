// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ARG and ENV: seed the client-side argument and environment caches.

use crate::{require_str, ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::Job;
use dird_dsl::ArgSpec;
use dird_store::CacheTag;
use serde_json::{Map, Value};

fn normalize_pair(vars: &Map<String, Value>) -> Result<Map<String, Value>, ComponentError> {
    let key = require_str(vars, "key")?;
    let value = vars
        .get("value")
        .cloned()
        .ok_or_else(|| ComponentError::malformed("value is required"))?;
    let mut def = Map::new();
    def.insert("key".to_string(), Value::String(key.to_string()));
    def.insert("value".to_string(), value);
    Ok(def)
}

fn pair(job: &Job) -> Result<(&str, Value), ComponentError> {
    let key = require_str(&job.definition, "key")?;
    let value = job
        .definition
        .get("value")
        .cloned()
        .ok_or_else(|| ComponentError::malformed("value is required"))?;
    Ok((key, value))
}

/// ARG: store a scalar in the argument cache.
pub struct Arg;

#[async_trait::async_trait]
impl Component for Arg {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("key").greedy("value")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        normalize_pair(vars)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let (key, value) = pair(job)?;
        ctx.caches.put(CacheTag::Args, key, value, ctx.now_ms())?;
        Ok(ComponentOutcome::success().with_info(format!("cached arg {key}")))
    }
}

/// ENV: store a string in the environment cache, exported to RUN children.
pub struct Env;

#[async_trait::async_trait]
impl Component for Env {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("key").greedy("value")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        normalize_pair(vars)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let (key, value) = pair(job)?;
        // Environment values are always strings
        let value = match value {
            Value::String(s) => Value::String(s),
            other => Value::String(other.to_string()),
        };
        ctx.caches.put(CacheTag::Envs, key, value, ctx.now_ms())?;
        Ok(ComponentOutcome::success().with_info(format!("cached env {key}")))
    }
}

#[cfg(test)]
#[path = "cache_args_tests.rs"]
mod tests;
