// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

#[test]
fn put_get_roundtrip_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FileStore::open(dir.path()).unwrap();
        store.put("jobs", "j1", json!({"verb": "RUN", "n": 1})).unwrap();
    }
    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(store.get("jobs", "j1").unwrap(), Some(json!({"verb": "RUN", "n": 1})));
}

#[test]
fn second_opener_is_rejected_while_locked() {
    let dir = tempfile::tempdir().unwrap();
    let _store = FileStore::open(dir.path()).unwrap();
    match FileStore::open(dir.path()) {
        Err(StoreError::Locked(_)) => {}
        other => panic!("expected Locked, got {other:?}"),
    }
}

#[parameterized(
    slash = { "a/b" },
    space = { "two words" },
    unicode = { "nodé" },
    dots = { "host.example.com" },
)]
fn awkward_keys_roundtrip(key: &str) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.put("args", key, json!("v")).unwrap();
    assert_eq!(store.get("args", key).unwrap(), Some(json!("v")));

    let scanned = store.scan("args", None).unwrap();
    assert_eq!(scanned, vec![(key.to_string(), json!("v"))]);
}

#[test]
fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.put("args", "k", json!(1)).unwrap();
    store.delete("args", "k").unwrap();
    store.delete("args", "k").unwrap();
    assert_eq!(store.get("args", "k").unwrap(), None);
}

#[test]
fn scan_respects_prefix_on_original_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.put("query", "region/n1", json!(1)).unwrap();
    store.put("query", "region/n2", json!(2)).unwrap();
    store.put("query", "zone/n1", json!(3)).unwrap();

    let scoped = store.scan("query", Some("region/")).unwrap();
    assert_eq!(scoped.len(), 2);
}

#[test]
fn no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.put("jobs", "j1", json!(1)).unwrap();
    store.put("jobs", "j1", json!(2)).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("jobs"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
