// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use serde_json::json;

fn def(value: serde_json::Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn identical_definitions_share_a_sha() {
    let a = def(json!({"command": "echo hi", "timeout_seconds": 30}));
    let b = def(json!({"timeout_seconds": 30, "command": "echo hi"}));
    assert_eq!(job_sha("RUN", &a), job_sha("RUN", &b));
}

#[test]
fn verb_participates_in_the_sha() {
    let d = def(json!({"key": "value"}));
    assert_ne!(job_sha("ARG", &d), job_sha("ENV", &d));
}

#[test]
fn volatile_fields_are_excluded() {
    let plain = def(json!({"command": "echo hi"}));
    let targeted = def(json!({
        "command": "echo hi",
        "targets": ["n1", "n2"],
        "restrict": ["abc"],
        "parent_async_bypass": true,
    }));
    assert_eq!(job_sha("RUN", &plain), job_sha("RUN", &targeted));
}

#[test]
fn nested_objects_are_canonicalized() {
    let a = def(json!({"vars": {"b": 1, "a": 2}}));
    let b = def(json!({"vars": {"a": 2, "b": 1}}));
    assert_eq!(job_sha("RUN", &a), job_sha("RUN", &b));
}

#[test]
fn sha_is_hex_encoded_sha256() {
    let d = def(json!({}));
    let sha = job_sha("RUN", &d);
    assert_eq!(sha.len(), 64);
    assert!(sha.chars().all(|c| c.is_ascii_hexdigit()));
}

proptest! {
    #[test]
    fn sha_is_deterministic(command in ".*", timeout in 0u64..100_000) {
        let d = def(json!({"command": command, "timeout_seconds": timeout}));
        prop_assert_eq!(job_sha("RUN", &d), job_sha("RUN", &d));
    }

    #[test]
    fn different_commands_rarely_collide(a in "[a-z]{1,20}", b in "[A-Z]{1,20}") {
        let da = def(json!({"command": a}));
        let db = def(json!({"command": b}));
        prop_assert_ne!(job_sha("RUN", &da), job_sha("RUN", &db));
    }
}
