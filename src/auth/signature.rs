// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::ServerError;

/// Verifies `signature` over `message` against `public_key`, all three
/// base64-encoded.
///
/// The public key must decode to exactly 32 bytes and the signature to 64.
/// Callers on the login path must not surface [`ServerError::MalformedInput`]
/// any differently from a plain `Ok(false)`.
pub fn verify_signature(
    public_key: &str,
    message: &str,
    signature: &str,
) -> Result<bool, ServerError> {
    let key_raw: [u8; 32] = STANDARD
        .decode(public_key)
        .map_err(|_| ServerError::MalformedInput)?
        .try_into()
        .map_err(|_| ServerError::MalformedInput)?;
    let key = VerifyingKey::from_bytes(&key_raw).map_err(|_| ServerError::MalformedInput)?;

    let message = STANDARD
        .decode(message)
        .map_err(|_| ServerError::MalformedInput)?;

    let sig_raw: [u8; 64] = STANDARD
        .decode(signature)
        .map_err(|_| ServerError::MalformedInput)?
        .try_into()
        .map_err(|_| ServerError::MalformedInput)?;
    let sig = Signature::from_bytes(&sig_raw);

    Ok(key.verify(&message, &sig).is_ok())
}
