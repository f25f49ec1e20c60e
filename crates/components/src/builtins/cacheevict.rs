// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CACHEEVICT: drop one cache partition, or all of them.

use crate::{require_str, ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::Job;
use dird_dsl::ArgSpec;
use dird_store::CacheTag;
use serde_json::{Map, Value};

pub struct CacheEvict;

#[async_trait::async_trait]
impl Component for CacheEvict {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("tag")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let tag = require_str(vars, "tag")?;
        tag.parse::<CacheTag>().map_err(ComponentError::Malformed)?;
        let mut def = Map::new();
        def.insert("tag".to_string(), Value::String(tag.to_string()));
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let tag: CacheTag =
            require_str(&job.definition, "tag")?.parse().map_err(ComponentError::Malformed)?;
        let removed = ctx.caches.evict(tag)?;
        Ok(ComponentOutcome::success()
            .with_stdout(format!("{removed}\n"))
            .with_info(format!("evicted {removed} entries from {tag}")))
    }
}

#[cfg(test)]
#[path = "cacheevict_tests.rs"]
mod tests;
