// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RUN: shell execution on the client.
//!
//! Commands run under `/bin/sh -c` in the WORKDIR-selected directory
//! with the env cache exported. Cancellation sends SIGTERM, waits the
//! termination grace, then SIGKILLs the process.

use crate::{require_str, ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::consts::TERMINATE_GRACE;
use dird_core::Job;
use dird_dsl::ArgSpec;
use dird_store::CacheTag;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde_json::{Map, Value};
use std::process::Stdio;

pub struct Run;

#[async_trait::async_trait]
impl Component for Run {
    fn args(&self) -> ArgSpec {
        ArgSpec::new().greedy("command").flag("no_block")
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let command = require_str(vars, "command")?;
        if command.trim().is_empty() {
            return Err(ComponentError::malformed("command must not be empty"));
        }
        let mut def = Map::new();
        def.insert("command".to_string(), Value::String(command.to_string()));
        if let Some(no_block) = vars.get("no_block") {
            def.insert("no_block".to_string(), no_block.clone());
        }
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        let command = require_str(&job.definition, "command")?;

        let mut cmd = tokio::process::Command::new("/bin/sh");
        cmd.arg("-c").arg(command);
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        if let Some(dir) = ctx.workdir() {
            cmd.current_dir(dir);
        }
        for (key, value) in ctx.caches.snapshot_strings(CacheTag::Envs, ctx.now_ms())? {
            cmd.env(key, value);
        }

        let child = cmd.spawn()?;
        let pid = child.id();
        let wait = child.wait_with_output();
        tokio::pin!(wait);

        let output = tokio::select! {
            output = &mut wait => output?,
            () = ctx.cancel.cancelled() => {
                terminate(pid, &mut wait).await;
                return Err(ComponentError::Cancelled);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let success = output.status.success();
        let info = match output.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        Ok(ComponentOutcome { stdout, stderr, success, info, callbacks: Vec::new() })
    }
}

/// SIGTERM the child, give it the grace period, then SIGKILL.
///
/// Waits for the child to actually reap before returning so the grace
/// window is honored; kill_on_drop backs this up if the signals fail.
async fn terminate<W>(pid: Option<u32>, wait: &mut std::pin::Pin<&mut W>)
where
    W: std::future::Future<Output = std::io::Result<std::process::Output>>,
{
    let Some(raw) = pid else {
        return;
    };
    let pid = Pid::from_raw(raw as i32);
    let _ = signal::kill(pid, Signal::SIGTERM);
    if tokio::time::timeout(TERMINATE_GRACE, wait.as_mut()).await.is_err() {
        let _ = signal::kill(pid, Signal::SIGKILL);
        let _ = wait.as_mut().await;
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
