// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WORKDIR: create a directory and make it the working directory for
//! subsequent jobs on this client.

use crate::{require_str, ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::Job;
use dird_dsl::ArgSpec;
use serde_json::{Map, Value};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

pub struct Workdir;

#[async_trait::async_trait]
impl Component for Workdir {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("path").option("mode")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let path = require_str(vars, "path")?;
        let mut def = Map::new();
        def.insert("path".to_string(), Value::String(path.to_string()));
        if let Some(mode) = vars.get("mode").and_then(Value::as_str) {
            u32::from_str_radix(mode, 8)
                .map_err(|_| ComponentError::malformed(format!("invalid mode: {mode}")))?;
            def.insert("mode".to_string(), Value::String(mode.to_string()));
        }
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let path = PathBuf::from(require_str(&job.definition, "path")?);
        tokio::fs::create_dir_all(&path).await?;
        if let Some(mode) = job.definition.get("mode").and_then(Value::as_str) {
            if let Ok(bits) = u32::from_str_radix(mode, 8) {
                tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(bits)).await?;
            }
        }
        ctx.set_workdir(path.clone());
        Ok(ComponentOutcome::success().with_info(format!("workdir {}", path.display())))
    }
}

#[cfg(test)]
#[path = "workdir_tests.rs"]
mod tests;
