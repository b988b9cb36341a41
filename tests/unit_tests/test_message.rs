// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use oxidrop::models::{
    message::{AcceptNotification, DeclineNotification, Envelope, UnknownKind, WsKind},
    transaction::FileInfo,
    user::MinimalUser,
};
use serde_json::{Value, json};

#[test]
fn test_kind_codes_cover_the_closed_set() {
    for code in 0u8..=15 {
        let kind = WsKind::from_u8(code).expect("codes 0..=15 are assigned");
        assert_eq!(u8::from(kind), code);
    }
    assert!(WsKind::from_u8(16).is_none());
    assert!(WsKind::from_u8(255).is_none());
}

#[test]
fn test_try_from_reports_the_unknown_code() {
    assert_eq!(WsKind::try_from(42), Err(UnknownKind(42)));
    assert_eq!(WsKind::try_from(12), Ok(WsKind::WebrtcSignal));
}

#[test]
fn test_envelope_wire_shape() {
    let frame = Envelope::new(WsKind::ConfigDiscoverable, true);
    let value = serde_json::to_value(&frame).expect("serializes");
    assert_eq!(value, json!({"type": 2, "data": true}));
}

#[test]
fn test_envelope_data_defaults_to_null() {
    let frame: Envelope =
        serde_json::from_str(r#"{"type": 3}"#).expect("payload-free frame parses");
    assert_eq!(frame.kind, 3);
    assert_eq!(frame.data, Value::Null);
}

#[test]
fn test_error_envelope() {
    let frame = Envelope::error("something broke");
    assert_eq!(frame.kind, u8::from(WsKind::Error));
    assert_eq!(frame.data, json!("something broke"));
}

#[test]
fn test_file_info_uses_the_type_field() {
    let file = FileInfo {
        name: "a.bin".to_string(),
        size: 100,
        mime: "application/octet-stream".to_string(),
    };
    let value = serde_json::to_value(&file).expect("serializes");
    assert_eq!(
        value,
        json!({"name": "a.bin", "size": 100, "type": "application/octet-stream"})
    );
}

#[test]
fn test_notification_shapes() {
    let responder = MinimalUser {
        username: "bob".to_string(),
        public_key: "pk-bob".to_string(),
    };

    let accept = AcceptNotification::new(&responder, "t-1".to_string());
    let value = serde_json::to_value(&accept).expect("serializes");
    assert_eq!(
        value,
        json!({
            "type": "accept_notification",
            "username": "bob",
            "accepted": true,
            "transaction_id": "t-1",
            "sender_public_key": "pk-bob",
        })
    );

    let decline =
        DeclineNotification::new(&responder, "t-1".to_string(), "busy".to_string());
    let value = serde_json::to_value(&decline).expect("serializes");
    assert_eq!(
        value,
        json!({
            "type": "decline_notification",
            "username": "bob",
            "declined": true,
            "transaction_id": "t-1",
            "reason": "busy",
        })
    );
}
