// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn timeout() -> Duration {
    Duration::from_millis(500)
}

#[tokio::test]
async fn request_round_trips_through_a_frame() {
    let request = Request::SendMessage {
        target: "mod-1".to_string(),
        message_type: "task.update".to_string(),
        payload: serde_json::json!({"n": 1}),
        blocking: true,
        callback_id: Some("cb-1".to_string()),
    };

    let mut buf = Vec::new();
    write_frame(&mut buf, &request, timeout()).await.unwrap();

    let mut cursor = std::io::Cursor::new(buf);
    let decoded: Request = read_frame(&mut cursor, timeout()).await.unwrap();
    match decoded {
        Request::SendMessage { target, message_type, blocking, callback_id, .. } => {
            assert_eq!(target, "mod-1");
            assert_eq!(message_type, "task.update");
            assert!(blocking);
            assert_eq!(callback_id.as_deref(), Some("cb-1"));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[tokio::test]
async fn response_round_trips_through_a_frame() {
    let response = Response::DispatchResult { session_id: weave_core::SessionId::new(), queued: true };

    let mut buf = Vec::new();
    write_frame(&mut buf, &response, timeout()).await.unwrap();

    let mut cursor = std::io::Cursor::new(buf);
    let decoded: Response = read_frame(&mut cursor, timeout()).await.unwrap();
    assert!(matches!(decoded, Response::DispatchResult { queued: true, .. }));
}

#[tokio::test]
async fn read_frame_on_clean_eof_before_any_bytes_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    let err = read_frame::<_, Request>(&mut cursor, timeout()).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn read_frame_rejects_a_length_prefix_over_the_limit() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(MAX_FRAME_BYTES + 1).to_be_bytes());
    let mut cursor = std::io::Cursor::new(buf);
    let err = read_frame::<_, Request>(&mut cursor, timeout()).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
}

#[tokio::test]
async fn read_frame_times_out_waiting_for_the_body() {
    // Length prefix claims 4 bytes but none follow; the read must time out
    // rather than block forever.
    let mut buf = Vec::new();
    buf.extend_from_slice(&4u32.to_be_bytes());
    let (mut reader, mut writer) = tokio::io::duplex(64);
    writer.write_all(&buf).await.unwrap();

    let err = read_frame::<_, Request>(&mut reader, Duration::from_millis(50)).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout));
}

#[test]
fn response_error_carries_kind_and_message() {
    let response = Response::error("not_found", "unknown workflow: wf-1");
    match response {
        Response::Error { error } => {
            assert_eq!(error.kind, "not_found");
            assert_eq!(error.message, "unknown workflow: wf-1");
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn agent_control_action_serializes_snake_case() {
    let json = serde_json::to_string(&AgentControlAction::Interrupt).unwrap();
    assert_eq!(json, "\"interrupt\"");
}
