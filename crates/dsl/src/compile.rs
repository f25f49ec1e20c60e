// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compilation of orchestration documents into job streams.
//!
//! Each document yields a fresh parent id and an ordered run of jobs.
//! Inline bodies are tokenized and bound against the verb's argument
//! spec; dict bodies pass vars through. Component normalization runs
//! here, so malformed definitions never reach the dispatcher.

use crate::argspec::{ArgSpec, BindError};
use crate::orchestration::{JobBody, OrchestrationDoc};
use crate::template;
use crate::tokenizer::{self, TokenizeError};
use dird_core::{Job, JobSpec};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// The verb registry as the compiler sees it: argument specs for
/// binding and server-side normalization for validation.
pub trait Catalog {
    fn arg_spec(&self, verb: &str) -> Option<ArgSpec>;
    fn normalize(
        &self,
        verb: &str,
        exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, String>;
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    #[error("verb must be an uppercase identifier: {0}")]
    InvalidVerb(String),

    #[error("job entries must be single-key mappings (got {0} keys)")]
    NotSingleKey(usize),

    #[error("tokenize error: {0}")]
    Tokenize(#[from] TokenizeError),

    #[error("invalid arguments for {verb}: {source}")]
    Bind {
        verb: String,
        #[source]
        source: BindError,
    },

    #[error("malformed {verb} definition: {message}")]
    Normalize { verb: String, message: String },
}

/// Submission-time knobs from the CLI.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Fallback targets for documents without their own
    pub targets: Vec<String>,
    /// When non-empty, only jobs whose fingerprint is listed survive
    pub restrict: Vec<String>,
    /// Force `skip_cache` on every compiled job
    pub ignore_cache: bool,
    /// Submitter-side template variables
    pub overrides: HashMap<String, String>,
}

/// Fields every verb shares; copied from bound vars into the definition
/// after component normalization.
const COMMON_FIELDS: &[&str] = &[
    "timeout_seconds",
    "timeout",
    "run_once",
    "skip_cache",
    "extend_args",
    "stdout_arg",
    "parent_async_bypass",
    "targets",
    "restrict",
];

/// Compile orchestration documents into an ordered job stream.
pub fn compile(
    docs: &[OrchestrationDoc],
    catalog: &dyn Catalog,
    opts: &CompileOptions,
    now_ms: u64,
) -> Result<Vec<Job>, CompileError> {
    let mut out = Vec::new();
    for doc in docs {
        let parent_id = uuid::Uuid::new_v4().to_string();
        let doc_targets = doc.targets.clone().unwrap_or_else(|| opts.targets.clone());

        for entry in &doc.jobs {
            let (verb, body) =
                entry.single().ok_or_else(|| CompileError::NotSingleKey(entry.0.len()))?;
            let job = build_job(BuildArgs {
                verb,
                body,
                parent_id: &parent_id,
                parent_async: doc.run_async,
                doc_targets: &doc_targets,
                catalog,
                opts,
                now_ms,
            })?;
            if !opts.restrict.is_empty() && !opts.restrict.contains(&job.job_sha) {
                continue;
            }
            out.push(job);
        }
    }
    Ok(out)
}

/// Compile a one-shot `exec` submission: a single job that is its own
/// parent.
pub fn compile_exec(
    verb: &str,
    arg_line: &str,
    targets: &[String],
    catalog: &dyn Catalog,
    opts: &CompileOptions,
    now_ms: u64,
) -> Result<Job, CompileError> {
    let body = JobBody::Inline(arg_line.to_string());
    build_job(BuildArgs {
        verb,
        body: &body,
        parent_id: "",
        parent_async: false,
        doc_targets: targets,
        catalog,
        opts,
        now_ms,
    })
}

/// Expand a callback job spec into a job under an existing parent.
///
/// Used by the coordinator when a component returns follow-up work; the
/// async gate is bypassed so chained tasks can run inside an async
/// parent.
pub fn compile_callback(
    spec: &JobSpec,
    parent_id: &str,
    catalog: &dyn Catalog,
    now_ms: u64,
) -> Result<Job, CompileError> {
    let mut vars = spec.vars.clone();
    vars.insert("parent_async_bypass".to_string(), Value::Bool(true));
    if let Some(targets) = &spec.targets {
        vars.insert(
            "targets".to_string(),
            Value::Array(targets.iter().cloned().map(Value::String).collect()),
        );
    }
    let body = JobBody::WithVars { vars };
    build_job(BuildArgs {
        verb: &spec.verb,
        body: &body,
        parent_id,
        parent_async: true,
        doc_targets: &[],
        catalog,
        opts: &CompileOptions::default(),
        now_ms,
    })
}

struct BuildArgs<'a> {
    verb: &'a str,
    body: &'a JobBody,
    parent_id: &'a str,
    parent_async: bool,
    doc_targets: &'a [String],
    catalog: &'a dyn Catalog,
    opts: &'a CompileOptions,
    now_ms: u64,
}

fn build_job(args: BuildArgs<'_>) -> Result<Job, CompileError> {
    let BuildArgs { verb, body, parent_id, parent_async, doc_targets, catalog, opts, now_ms } =
        args;

    validate_verb(verb)?;
    let spec = catalog
        .arg_spec(verb)
        .ok_or_else(|| CompileError::UnknownVerb(verb.to_string()))?
        .with_common_options();

    let (exec, mut vars) = match body {
        JobBody::Inline(line) => {
            let rendered = template::interpolate(line, &opts.overrides);
            let tokens = tokenizer::split_words(&rendered)?;
            let vars = spec
                .bind(&tokens)
                .map_err(|source| CompileError::Bind { verb: verb.to_string(), source })?;
            (tokens, vars)
        }
        JobBody::WithVars { vars } => {
            let mut vars = vars.clone();
            for value in vars.values_mut() {
                template::interpolate_json(value, &opts.overrides);
            }
            (Vec::new(), vars)
        }
    };

    if opts.ignore_cache {
        vars.insert("skip_cache".to_string(), Value::Bool(true));
    }
    if !vars.contains_key("targets") && !doc_targets.is_empty() {
        vars.insert(
            "targets".to_string(),
            Value::Array(doc_targets.iter().cloned().map(Value::String).collect()),
        );
    }

    let mut definition = catalog
        .normalize(verb, &exec, &vars)
        .map_err(|message| CompileError::Normalize { verb: verb.to_string(), message })?;

    // Common fields ride along even when the component ignores them
    for field in COMMON_FIELDS {
        if let Some(value) = vars.get(*field) {
            definition.entry(field.to_string()).or_insert_with(|| value.clone());
        }
    }

    let parent = if parent_id.is_empty() { None } else { Some(parent_id.to_string()) };
    Ok(Job::new(verb, definition, parent, parent_async, now_ms))
}

fn validate_verb(verb: &str) -> Result<(), CompileError> {
    let mut chars = verb.chars();
    let valid = matches!(chars.next(), Some('A'..='Z'))
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CompileError::InvalidVerb(verb.to_string()))
    }
}

#[cfg(test)]
#[path = "compile_tests.rs"]
mod tests;
