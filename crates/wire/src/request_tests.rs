// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn requests_tag_by_type() {
    let encoded = serde_json::to_string(&Request::Ping).unwrap();
    assert_eq!(encoded, r#"{"type":"Ping"}"#);
}

#[test]
fn submit_orchestrations_defaults_optional_fields() {
    let decoded: Request = serde_json::from_str(
        r#"{"type":"SubmitOrchestrations","docs":[{"jobs":[{"RUN":"echo hi"}]}]}"#,
    )
    .unwrap();
    match decoded {
        Request::SubmitOrchestrations { docs, targets, restrict, ignore_cache, overrides } => {
            assert_eq!(docs.len(), 1);
            assert!(targets.is_empty());
            assert!(restrict.is_empty());
            assert!(!ignore_cache);
            assert!(overrides.is_empty());
        }
        other => panic!("unexpected request {other:?}"),
    }
}

#[test]
fn submit_exec_roundtrips() {
    let request = Request::SubmitExec {
        verb: "RUN".to_string(),
        args: "echo hello".to_string(),
        targets: vec!["n1".to_string()],
    };
    let encoded = serde_json::to_string(&request).unwrap();
    let decoded: Request = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, request);
}
