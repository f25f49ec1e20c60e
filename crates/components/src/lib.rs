// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dird-components: the component ABI, registry, and built-in verbs.
//!
//! A component is one named unit of work. It declares an argument spec
//! for DSL parsing, normalizes definitions on the server, and executes
//! on the client against the local caches.

mod builtins;
mod context;
mod loader;
mod registry;

pub use context::{ClientCtx, FileSource, LocalFileSource};
pub use registry::Registry;

use dird_core::{Job, JobSpec};
use dird_dsl::ArgSpec;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from component normalization and execution.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("{0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Store(#[from] dird_store::StoreError),

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("cancelled")]
    Cancelled,
}

impl ComponentError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// What a component execution produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentOutcome {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub info: String,
    /// Follow-up jobs the coordinator should enqueue with
    /// `parent_async_bypass` set
    pub callbacks: Vec<JobSpec>,
}

impl ComponentOutcome {
    pub fn success() -> Self {
        Self { success: true, ..Self::default() }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self { stderr: stderr.into(), ..Self::default() }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_callback(mut self, spec: JobSpec) -> Self {
        self.callbacks.push(spec);
        self
    }
}

/// The contract every verb satisfies.
#[async_trait::async_trait]
pub trait Component: Send + Sync {
    /// Parser specification for the inline DSL form.
    fn args(&self) -> ArgSpec;

    /// Server-side normalization: turn bound vars (plus the raw exec
    /// tokens) into the job definition, rejecting malformed specs.
    fn server(
        &self,
        exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError>;

    /// Client-side execution against the local caches.
    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError>;

    /// Whether the executor may run this component on the bounded
    /// non-blocking pool instead of the ordered loop.
    fn no_block(&self) -> bool {
        false
    }
}

/// Read a required string field from a definition or vars map.
pub(crate) fn require_str<'m>(
    map: &'m Map<String, Value>,
    field: &str,
) -> Result<&'m str, ComponentError> {
    map.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ComponentError::malformed(format!("{field} is required")))
}
