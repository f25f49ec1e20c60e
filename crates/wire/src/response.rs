// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use dird_core::{JobAnalysis, ParentAnalysis};
use serde::{Deserialize, Serialize};

use super::{JobDetail, JobSummary, NodeEntry};

/// Response from the server to the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Submission accepted; one parent id per orchestration
    Accepted { parent_ids: Vec<String> },

    /// Known workers
    Nodes { nodes: Vec<NodeEntry> },

    /// Job listing
    Jobs { jobs: Vec<JobSummary> },

    /// Single job record
    Job { job: Option<Box<JobDetail>> },

    /// Completion poll result
    Poll {
        done: bool,
        /// None while still in flight
        success: Option<bool>,
        info: String,
    },

    /// Purge result
    Purged { count: usize },

    /// Export result
    Exported { path: PathBuf, count: usize },

    /// Single-job profile
    Analysis { report: Box<JobAnalysis> },

    /// Orchestration-wide profile
    ParentAnalysis { report: Box<ParentAnalysis> },

    /// Key generation outcome (driver-specific)
    Keys { message: String },

    /// Server is shutting down
    ShuttingDown,

    /// Error response
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
