// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn beat(version: &str) -> Heartbeat {
    Heartbeat {
        version: version.to_string(),
        host_uptime_secs: 3600,
        agent_uptime_secs: 60,
        components: vec!["RUN".to_string()],
    }
}

#[test]
fn heartbeat_extends_expiry_by_interval_times_liveness() {
    let record = WorkerRecord::from_heartbeat("n1".into(), beat("0.1.0"), 1_000);
    assert_eq!(record.expiry_ms, 1_000 + 60 * 3 * 1_000);
    assert!(record.is_alive(1_001));
    assert!(record.is_alive(180_999));
    assert!(!record.is_alive(181_000));
}

#[test]
fn observe_refreshes_fields_and_deadline() {
    let mut record = WorkerRecord::from_heartbeat("n1".into(), beat("0.1.0"), 1_000);
    record.observe(beat("0.2.0"), 120_000);
    assert_eq!(record.last_seen_ms, 120_000);
    assert_eq!(record.expiry_ms, 120_000 + 180_000);
    assert_eq!(record.version, "0.2.0");
}
