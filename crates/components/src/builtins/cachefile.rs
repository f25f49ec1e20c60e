// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CACHEFILE: load a YAML mapping from the client's filesystem into the
//! argument cache.

use crate::{require_str, ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::Job;
use dird_dsl::ArgSpec;
use dird_store::CacheTag;
use serde_json::{Map, Value};

pub struct CacheFile;

#[async_trait::async_trait]
impl Component for CacheFile {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("path")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let path = require_str(vars, "path")?;
        let mut def = Map::new();
        def.insert("path".to_string(), Value::String(path.to_string()));
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let path = require_str(&job.definition, "path")?;
        let text = tokio::fs::read_to_string(path).await?;
        let parsed: Value = serde_yaml::from_str(&text)
            .map_err(|e| ComponentError::malformed(format!("{path}: {e}")))?;
        let Value::Object(entries) = parsed else {
            return Err(ComponentError::malformed(format!("{path}: expected a YAML mapping")));
        };

        let now_ms = ctx.now_ms();
        let count = entries.len();
        for (key, value) in entries {
            ctx.caches.put(CacheTag::Args, &key, value, now_ms)?;
        }
        Ok(ComponentOutcome::success().with_info(format!("cached {count} args from {path}")))
    }
}

#[cfg(test)]
#[path = "cachefile_tests.rs"]
mod tests;
