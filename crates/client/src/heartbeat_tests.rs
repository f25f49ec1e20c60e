// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dird_driver::InprocHub;

#[test]
fn jitter_stays_within_ten_percent() {
    let interval = Duration::from_secs(60);
    for _ in 0..100 {
        let j = jittered(interval);
        assert!(j >= Duration::from_secs(54), "too short: {j:?}");
        assert!(j <= Duration::from_millis(66_000), "too long: {j:?}");
    }
}

#[tokio::test]
async fn beats_carry_version_and_components() {
    let hub = InprocHub::new();
    let server = hub.server().unwrap();
    let client = Arc::new(hub.client("n1".into()));

    tokio::spawn(heartbeat_task(
        client,
        "n1".into(),
        vec!["RUN".to_string(), "ARG".to_string()],
        Duration::from_secs(60),
    ));

    let (identity, beat) = server.heartbeat_recv().await.unwrap();
    assert_eq!(identity, Identity::from("n1"));
    assert_eq!(beat.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(beat.components, vec!["RUN".to_string(), "ARG".to_string()]);
}
