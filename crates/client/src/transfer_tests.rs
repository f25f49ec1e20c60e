// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dird_driver::InprocHub;

/// Minimal server answering one fetch the way the coordinator does.
async fn answer_fetch(server: Arc<dyn Driver>, content: Option<&[u8]>) {
    let (identity, request) = server.recv(Channel::Transfer).await.unwrap();
    assert_eq!(request.command, "fetch");
    let path = request.data["path"].as_str().unwrap().to_string();
    let reply = match content {
        Some(bytes) => Frame::new("fetch").with_data(json!({
            "path": path,
            "content": base64::engine::general_purpose::STANDARD.encode(bytes),
        })),
        None => {
            Frame::new("fetch").with_data(json!({"path": path, "error": "no such file"})).nacked()
        }
    };
    server.send(Channel::Transfer, &identity, reply).await.unwrap();
}

#[tokio::test]
async fn fetch_decodes_served_bytes() {
    let hub = InprocHub::new();
    let server: Arc<dyn Driver> = Arc::new(hub.server().unwrap());
    let client: Arc<dyn Driver> = Arc::new(hub.client("n1".into()));

    tokio::spawn(answer_fetch(server, Some(b"file payload")));

    let source = DriverFileSource::new(client, "n1".into());
    let bytes = source.fetch("/etc/app.conf").await.unwrap();
    assert_eq!(bytes, b"file payload");
}

#[tokio::test]
async fn nacked_replies_surface_as_transfer_errors() {
    let hub = InprocHub::new();
    let server: Arc<dyn Driver> = Arc::new(hub.server().unwrap());
    let client: Arc<dyn Driver> = Arc::new(hub.client("n1".into()));

    tokio::spawn(answer_fetch(server, None));

    let source = DriverFileSource::new(client, "n1".into());
    let result = source.fetch("/missing").await;
    match result {
        Err(ComponentError::Transfer(message)) => assert!(message.contains("no such file")),
        other => panic!("expected Transfer error, got {other:?}"),
    }
}
