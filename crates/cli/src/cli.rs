// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dird", version, about = "Distributed task execution platform")]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Transport plug-in name (tcp, inproc)
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// Host or IP the client connects to
    #[arg(long, global = true)]
    pub server_address: Option<String>,

    /// Server listen address
    #[arg(long, global = true)]
    pub bind_address: Option<String>,

    /// Seconds between heartbeats
    #[arg(long, global = true)]
    pub heartbeat_interval: Option<u64>,

    /// UNIX socket path for local RPC
    #[arg(long, global = true)]
    pub socket_path: Option<PathBuf>,

    /// Plain-text authentication token for applicable drivers
    #[arg(long, global = true)]
    pub shared_key: Option<String>,

    /// Enable asymmetric-key encryption for applicable drivers
    #[arg(long, global = true)]
    pub curve_encryption: bool,

    /// Datastore backend URL (memory, file:///...)
    #[arg(long, global = true)]
    pub datastore: Option<String>,

    /// Default cache TTL in seconds
    #[arg(long, global = true)]
    pub cache_ttl: Option<u64>,

    /// Extra directory for user-defined components
    #[arg(long, global = true)]
    pub component_path: Option<PathBuf>,

    /// Client identity (defaults to the host name)
    #[arg(long, global = true)]
    pub identity: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the coordinator
    Server,

    /// Run a worker
    Client,

    /// One-shot execution of a single verb
    Exec {
        /// Component name, uppercase
        #[arg(long)]
        verb: String,

        /// Inline argument line for the verb
        args: String,

        /// Target identities (default: all alive)
        #[arg(long = "target")]
        targets: Vec<String>,

        /// Poll until the job settles
        #[arg(long)]
        wait: bool,
    },

    /// Submit orchestration files
    Orchestrate {
        /// YAML orchestration files, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Target identities for documents without their own
        #[arg(long = "target")]
        targets: Vec<String>,

        /// Only run jobs with these fingerprints
        #[arg(long = "restrict")]
        restrict: Vec<String>,

        /// Bypass client-side cache hits
        #[arg(long)]
        ignore_cache: bool,

        /// Poll until every submitted job settles
        #[arg(long)]
        wait: bool,

        /// Template override, KEY=VALUE (repeatable)
        #[arg(long = "var", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,
    },

    /// Run catalog orchestrations with bounded concurrency
    Bootstrap {
        /// Catalog files (repeatable)
        #[arg(long = "catalog", required = true)]
        catalogs: Vec<PathBuf>,

        /// Concurrent catalog submissions
        #[arg(long, default_value_t = 5)]
        thread: usize,
    },

    /// Inspect and maintain the cluster
    Manage(ManageArgs),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ManageArgs {
    /// List known workers
    #[arg(long)]
    pub list_nodes: bool,

    /// List all jobs
    #[arg(long)]
    pub list_jobs: bool,

    /// Show one job record (id or unique prefix)
    #[arg(long, value_name = "ID")]
    pub job_info: Option<String>,

    /// Write all job records to a JSON file on the server
    #[arg(long, value_name = "PATH")]
    pub export_jobs: Option<PathBuf>,

    /// Profile one job
    #[arg(long, value_name = "ID")]
    pub analyze_job: Option<String>,

    /// Profile every job under a parent
    #[arg(long, value_name = "ID")]
    pub analyze_parent: Option<String>,

    /// Drop every job record
    #[arg(long)]
    pub purge_jobs: bool,

    /// Drop every worker record
    #[arg(long)]
    pub purge_nodes: bool,

    /// Generate driver key material, where supported
    #[arg(long)]
    pub generate_keys: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got: {raw}")),
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
