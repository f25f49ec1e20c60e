// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ADD/COPY: place a file on the client.
//!
//! Bytes come through the context's [`FileSource`] (the driver's
//! transfer channel on a real worker). With `--blueprint`, file
//! contents get the same template pass job fields do, rendered against
//! the argument cache.

use crate::{require_str, ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::Job;
use dird_dsl::ArgSpec;
use dird_store::CacheTag;
use serde_json::{Map, Value};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

pub struct Transfer;

#[async_trait::async_trait]
impl Component for Transfer {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().positional("source").positional("dest").flag("blueprint").option("mode")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let source = require_str(vars, "source")?;
        let dest = require_str(vars, "dest")?;
        if let Some(mode) = vars.get("mode").and_then(Value::as_str) {
            u32::from_str_radix(mode, 8)
                .map_err(|_| ComponentError::malformed(format!("invalid mode: {mode}")))?;
        }
        let mut def = Map::new();
        def.insert("source".to_string(), Value::String(source.to_string()));
        def.insert("dest".to_string(), Value::String(dest.to_string()));
        for field in ["blueprint", "mode"] {
            if let Some(value) = vars.get(field) {
                def.insert(field.to_string(), value.clone());
            }
        }
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let source = require_str(&job.definition, "source")?;
        let dest = require_str(&job.definition, "dest")?;
        let blueprint =
            job.definition.get("blueprint").and_then(Value::as_bool).unwrap_or(false);

        let mut bytes = ctx.files.fetch(source).await?;
        if blueprint {
            let text = String::from_utf8(bytes).map_err(|_| {
                ComponentError::malformed(format!("{source} is not valid UTF-8 for blueprint"))
            })?;
            let args = ctx.caches.snapshot_strings(CacheTag::Args, ctx.now_ms())?;
            bytes = dird_dsl::interpolate(&text, &args).into_bytes();
        }

        let mut dest_path = PathBuf::from(dest);
        if dest_path.is_relative() {
            if let Some(workdir) = ctx.workdir() {
                dest_path = workdir.join(dest_path);
            }
        }
        if let Some(parent) = dest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let written = bytes.len();
        tokio::fs::write(&dest_path, bytes).await?;

        if let Some(mode) = job.definition.get("mode").and_then(Value::as_str) {
            if let Ok(bits) = u32::from_str_radix(mode, 8) {
                tokio::fs::set_permissions(&dest_path, std::fs::Permissions::from_mode(bits))
                    .await?;
            }
        }

        Ok(ComponentOutcome::success()
            .with_info(format!("wrote {written} bytes to {}", dest_path.display())))
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
