// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::path::PathBuf;

use dird_dsl::OrchestrationDoc;
use serde::{Deserialize, Serialize};

/// Request from the CLI to the server over the control socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Submit compiled-to-be orchestration documents
    SubmitOrchestrations {
        docs: Vec<OrchestrationDoc>,
        /// Fallback targets for documents without their own
        #[serde(default)]
        targets: Vec<String>,
        /// Fingerprint allowlist; empty means every job runs
        #[serde(default)]
        restrict: Vec<String>,
        /// Force `skip_cache` on every compiled job
        #[serde(default)]
        ignore_cache: bool,
        /// Submitter-side template variables
        #[serde(default)]
        overrides: HashMap<String, String>,
    },

    /// One-shot execution of a single verb
    SubmitExec {
        verb: String,
        /// Inline argument line, tokenized server-side
        args: String,
        #[serde(default)]
        targets: Vec<String>,
    },

    /// List known workers, dead or alive
    ListNodes,

    /// List all jobs
    ListJobs,

    /// Full record for one job (id or unique prefix)
    JobInfo { id: String },

    /// Completion poll for one job
    PollJob { id: String },

    /// Drop every terminal and pending job record
    PurgeJobs,

    /// Drop every worker record
    PurgeNodes,

    /// Write all job records to a JSON file on the server
    ExportJobs { path: PathBuf },

    /// Profile one job across its nodes
    AnalyzeJob { id: String },

    /// Profile every job under a parent
    AnalyzeParent { id: String },

    /// Driver-specific key material generation
    GenerateKeys,

    /// Launch the read-only dashboard, where supported
    RunUi,

    /// Request server shutdown
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
