// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format tests: length-prefix framing and JSON encoding.

use super::*;

#[test]
fn encode_returns_json_without_length_prefix() {
    let response = Response::Ok;
    let encoded = encode(&response).expect("encode failed");

    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(json_str.starts_with('{'), "should be JSON object: {}", json_str);
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original).await.expect("write failed");

    // write_message adds 4-byte length prefix
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn length_prefix_is_big_endian_payload_size() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data).await.expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn truncated_stream_reads_as_connection_closed() {
    let mut buffer = Vec::new();
    write_message(&mut buffer, b"full message").await.unwrap();
    buffer.truncate(buffer.len() - 3);

    let mut cursor = std::io::Cursor::new(buffer);
    match read_message(&mut cursor).await {
        Err(ProtocolError::ConnectionClosed) => {}
        other => panic!("expected ConnectionClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_length_is_rejected_before_allocation() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&u32::MAX.to_be_bytes());
    buffer.extend_from_slice(b"junk");

    let mut cursor = std::io::Cursor::new(buffer);
    match read_message(&mut cursor).await {
        Err(ProtocolError::Oversized(len)) => assert_eq!(len, u32::MAX),
        other => panic!("expected Oversized, got {other:?}"),
    }
}

#[tokio::test]
async fn request_response_roundtrip_through_framing() {
    let timeout = std::time::Duration::from_secs(1);

    let mut buffer = Vec::new();
    write_request(&mut buffer, &Request::Ping, timeout).await.unwrap();
    let mut cursor = std::io::Cursor::new(buffer);
    let request = read_request(&mut cursor, timeout).await.unwrap();
    assert_eq!(request, Request::Ping);

    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::Pong, timeout).await.unwrap();
    let mut cursor = std::io::Cursor::new(buffer);
    let response = read_response(&mut cursor, timeout).await.unwrap();
    assert_eq!(response, Response::Pong);
}
