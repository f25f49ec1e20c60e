// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration resolution: flag > file > default.
//!
//! The file is flat YAML; every key is also a command-line flag of the
//! same name.

use crate::cli::Cli;
use crate::exit_error::ExitError;
use dird_core::consts::{DEFAULT_CACHE_TTL_SECS, HEARTBEAT_INTERVAL_SECS};
use dird_core::Identity;
use dird_driver::DriverConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/directord/config.yaml";
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/directord.sock";

/// Flat YAML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub driver: Option<String>,
    pub server_address: Option<String>,
    pub bind_address: Option<String>,
    pub heartbeat_interval: Option<u64>,
    pub debug: Option<bool>,
    pub socket_path: Option<PathBuf>,
    pub shared_key: Option<String>,
    pub curve_encryption: Option<bool>,
    pub datastore: Option<String>,
    pub cache_ttl: Option<u64>,
    pub component_path: Option<PathBuf>,
    pub identity: Option<String>,
}

impl FileConfig {
    /// Load from an explicit path (must exist) or the default path
    /// (may be absent).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ExitError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                return Ok(Self::default())
            }
            Err(e) => {
                return Err(ExitError::invalid(format!("cannot read {}: {e}", path.display())))
            }
        };
        serde_yaml::from_str(&text)
            .map_err(|e| ExitError::invalid(format!("invalid config {}: {e}", path.display())))
    }
}

/// Fully-resolved settings used to build server and worker configs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub driver: String,
    pub server_address: String,
    pub bind_address: String,
    pub heartbeat_interval: u64,
    pub debug: bool,
    pub socket_path: PathBuf,
    pub shared_key: Option<String>,
    pub curve_encryption: bool,
    pub datastore: String,
    pub cache_ttl: u64,
    pub component_path: Option<PathBuf>,
    pub identity: Identity,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Self {
        let identity = cli
            .identity
            .clone()
            .or(file.identity)
            .map_or_else(Identity::local, Identity::from);
        Self {
            driver: cli.driver.clone().or(file.driver).unwrap_or_else(|| "tcp".to_string()),
            server_address: cli
                .server_address
                .clone()
                .or(file.server_address)
                .unwrap_or_else(|| "127.0.0.1:5555".to_string()),
            bind_address: cli
                .bind_address
                .clone()
                .or(file.bind_address)
                .unwrap_or_else(|| "0.0.0.0:5555".to_string()),
            heartbeat_interval: cli
                .heartbeat_interval
                .or(file.heartbeat_interval)
                .unwrap_or(HEARTBEAT_INTERVAL_SECS),
            debug: cli.debug || file.debug.unwrap_or(false),
            socket_path: cli
                .socket_path
                .clone()
                .or(file.socket_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH)),
            shared_key: cli.shared_key.clone().or(file.shared_key),
            curve_encryption: cli.curve_encryption || file.curve_encryption.unwrap_or(false),
            datastore: cli
                .datastore
                .clone()
                .or(file.datastore)
                .unwrap_or_else(|| "memory".to_string()),
            cache_ttl: cli.cache_ttl.or(file.cache_ttl).unwrap_or(DEFAULT_CACHE_TTL_SECS),
            component_path: cli.component_path.clone().or(file.component_path),
            identity,
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            driver: self.driver.clone(),
            bind_address: self.bind_address.clone(),
            server_address: self.server_address.clone(),
            identity: self.identity.clone(),
            shared_key: self.shared_key.clone(),
            curve_encryption: self.curve_encryption,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
