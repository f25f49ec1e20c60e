// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::Parser;

fn cli(args: &[&str]) -> Cli {
    Cli::parse_from(args)
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let settings = Settings::resolve(&cli(&["dird", "server"]), FileConfig::default());
    assert_eq!(settings.driver, "tcp");
    assert_eq!(settings.bind_address, "0.0.0.0:5555");
    assert_eq!(settings.server_address, "127.0.0.1:5555");
    assert_eq!(settings.heartbeat_interval, 60);
    assert_eq!(settings.cache_ttl, 43_200);
    assert_eq!(settings.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
    assert_eq!(settings.datastore, "memory");
    assert!(!settings.debug);
    assert!(!settings.curve_encryption);
}

#[test]
fn file_values_override_defaults() {
    let file: FileConfig = serde_yaml::from_str(
        "driver: inproc\nheartbeat_interval: 5\ndatastore: file:///var/cache/directord\ndebug: true\n",
    )
    .unwrap();
    let settings = Settings::resolve(&cli(&["dird", "server"]), file);
    assert_eq!(settings.driver, "inproc");
    assert_eq!(settings.heartbeat_interval, 5);
    assert_eq!(settings.datastore, "file:///var/cache/directord");
    assert!(settings.debug);
}

#[test]
fn flags_override_the_file() {
    let file: FileConfig = serde_yaml::from_str("driver: inproc\nsocket_path: /tmp/a.sock\n").unwrap();
    let settings = Settings::resolve(
        &cli(&["dird", "--driver", "tcp", "--socket-path", "/tmp/b.sock", "server"]),
        file,
    );
    assert_eq!(settings.driver, "tcp");
    assert_eq!(settings.socket_path, PathBuf::from("/tmp/b.sock"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "no_such_key: 1\n").unwrap();
    let err = FileConfig::load(Some(&path)).unwrap_err();
    assert_eq!(err.code, crate::exit_error::EXIT_INVALID_INPUT);
}

#[test]
fn explicit_config_path_must_exist() {
    let err = FileConfig::load(Some(std::path::Path::new("/nonexistent/d.yaml"))).unwrap_err();
    assert_eq!(err.code, crate::exit_error::EXIT_INVALID_INPUT);
}

#[test]
fn missing_default_config_is_fine() {
    // The conventional path rarely exists on dev machines
    let settings =
        Settings::resolve(&cli(&["dird", "client"]), FileConfig::default());
    assert_eq!(settings.identity, dird_core::Identity::local());
}

#[test]
fn identity_flag_overrides_hostname() {
    let settings =
        Settings::resolve(&cli(&["dird", "--identity", "worker-7", "client"]), FileConfig::default());
    assert_eq!(settings.identity.as_str(), "worker-7");
}

#[test]
fn driver_config_carries_auth_settings() {
    let settings = Settings::resolve(
        &cli(&["dird", "--shared-key", "sekrit", "server"]),
        FileConfig::default(),
    );
    let driver = settings.driver_config();
    assert_eq!(driver.shared_key.as_deref(), Some("sekrit"));
    assert!(!driver.curve_encryption);
}
