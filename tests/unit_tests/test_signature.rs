// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ed25519_dalek::{Signer, SigningKey};
use oxidrop::{auth::signature::verify_signature, error::ServerError};

fn keypair(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

fn public_b64(key: &SigningKey) -> String {
    STANDARD.encode(key.verifying_key().to_bytes())
}

#[test]
fn test_valid_signature_verifies() {
    let key = keypair(7);
    let message = b"fresh login nonce";
    let signature = key.sign(message);

    let ok = verify_signature(
        &public_b64(&key),
        &STANDARD.encode(message),
        &STANDARD.encode(signature.to_bytes()),
    )
    .expect("well-formed input");
    assert!(ok);
}

#[test]
fn test_wrong_key_is_rejected() {
    let signer = keypair(7);
    let other = keypair(8);
    let message = b"fresh login nonce";
    let signature = signer.sign(message);

    let ok = verify_signature(
        &public_b64(&other),
        &STANDARD.encode(message),
        &STANDARD.encode(signature.to_bytes()),
    )
    .expect("well-formed input");
    assert!(!ok);
}

#[test]
fn test_tampered_message_is_rejected() {
    let key = keypair(7);
    let signature = key.sign(b"original message");

    let ok = verify_signature(
        &public_b64(&key),
        &STANDARD.encode(b"tampered message"),
        &STANDARD.encode(signature.to_bytes()),
    )
    .expect("well-formed input");
    assert!(!ok);
}

#[test]
fn test_invalid_base64_is_malformed() {
    let key = keypair(7);
    let signature = key.sign(b"message");

    let err = verify_signature(
        "not base64!!!",
        &STANDARD.encode(b"message"),
        &STANDARD.encode(signature.to_bytes()),
    )
    .expect_err("garbage key must not verify");
    assert!(matches!(err, ServerError::MalformedInput));
}

#[test]
fn test_short_public_key_is_malformed() {
    let key = keypair(7);
    let signature = key.sign(b"message");

    let err = verify_signature(
        &STANDARD.encode([1u8; 16]),
        &STANDARD.encode(b"message"),
        &STANDARD.encode(signature.to_bytes()),
    )
    .expect_err("16-byte key must not verify");
    assert!(matches!(err, ServerError::MalformedInput));
}

#[test]
fn test_short_signature_is_malformed() {
    let key = keypair(7);

    let err = verify_signature(
        &public_b64(&key),
        &STANDARD.encode(b"message"),
        &STANDARD.encode([2u8; 32]),
    )
    .expect_err("32-byte signature must not verify");
    assert!(matches!(err, ServerError::MalformedInput));
}
