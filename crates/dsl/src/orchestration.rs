// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestration file format.
//!
//! A YAML list of documents, each with a required `jobs` list of
//! single-key mappings (VERB → inline string or `{vars: ...}` dict).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("invalid orchestration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One orchestration: an ordered set of jobs sharing a parent id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Explicit target identities; absent means all alive nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,

    /// Relaxes the per-identity ordering contract
    #[serde(default, rename = "async")]
    pub run_async: bool,

    pub jobs: Vec<JobEntry>,
}

/// A single-key mapping: verb → body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobEntry(pub BTreeMap<String, JobBody>);

impl JobEntry {
    /// The (verb, body) pair, or None when the mapping isn't single-key.
    pub fn single(&self) -> Option<(&str, &JobBody)> {
        if self.0.len() != 1 {
            return None;
        }
        self.0.iter().next().map(|(verb, body)| (verb.as_str(), body))
    }
}

/// Inline form is tokenized; dict form passes vars straight through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobBody {
    Inline(String),
    WithVars {
        #[serde(default)]
        vars: Map<String, Value>,
    },
}

/// Parse one orchestration file's contents.
pub fn load_documents(yaml: &str) -> Result<Vec<OrchestrationDoc>, OrchestrationError> {
    Ok(serde_yaml::from_str(yaml)?)
}

#[cfg(test)]
#[path = "orchestration_tests.rs"]
mod tests;
