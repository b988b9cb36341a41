// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! End-to-end login walkthroughs against the REST handlers: register,
//! fetch a challenge, sign it, trade it for a token. Tampering with any
//! step must yield the one indistinguishable failure reply.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::Response};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{TimeDelta, Utc};
use ed25519_dalek::{Signer, SigningKey};
use oxidrop::{
    auth::token,
    server::{
        Context,
        http::{self, LoginBody, RegisterBody, Reply},
    },
};
use serde_json::Value;

use super::{TEST_SECRET, memory_context};

async fn body(response: Response) -> (StatusCode, Reply) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let reply = serde_json::from_slice(&bytes).expect("envelope parses");
    (status, reply)
}

async fn register(ctx: &Arc<Context>, username: &str, public_key: &str) -> Response {
    http::register(
        State(Arc::clone(ctx)),
        Ok(Json(RegisterBody {
            username: username.to_string(),
            public_key: public_key.to_string(),
        })),
    )
    .await
}

async fn login(
    ctx: &Arc<Context>,
    public_key: &str,
    challenge: &str,
    signature: &str,
) -> Response {
    http::login(
        State(Arc::clone(ctx)),
        Ok(Json(LoginBody {
            public_key: public_key.to_string(),
            challenge: challenge.to_string(),
            signature: signature.to_string(),
        })),
    )
    .await
}

fn sign_challenge(key: &SigningKey, challenge: &str) -> String {
    let raw = STANDARD.decode(challenge).expect("challenge is base64");
    STANDARD.encode(key.sign(&raw).to_bytes())
}

#[tokio::test]
async fn test_register_challenge_login_roundtrip() {
    let ctx = memory_context().await;
    let key = SigningKey::from_bytes(&[9u8; 32]);
    let public_key = STANDARD.encode(key.verifying_key().to_bytes());

    let (status, reply) = body(register(&ctx, "alice", &public_key).await).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply.success);
    assert_eq!(reply.message, "user");
    assert_eq!(reply.data["username"], Value::from("alice"));

    let (status, reply) = body(http::challenge(State(Arc::clone(&ctx))).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply.message, "challenge");
    let challenge = reply.data.as_str().expect("nonce is a string").to_string();
    assert_eq!(ctx.challenges.len(), 1, "nonce is recorded server-side");

    let signature = sign_challenge(&key, &challenge);
    let (status, reply) = body(login(&ctx, &public_key, &challenge, &signature).await).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply.success);
    assert_eq!(reply.message, "login success");

    let minted = reply.data.as_str().expect("token is a string");
    let claims = token::verify(TEST_SECRET, minted).expect("token verifies");
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.public_key, public_key);
    assert!(ctx.challenges.is_empty(), "login consumed the nonce");
}

#[tokio::test]
async fn test_every_login_failure_reads_the_same() {
    let ctx = memory_context().await;
    let key = SigningKey::from_bytes(&[9u8; 32]);
    let stranger = SigningKey::from_bytes(&[13u8; 32]);
    let public_key = STANDARD.encode(key.verifying_key().to_bytes());
    let unknown_key = STANDARD.encode(stranger.verifying_key().to_bytes());

    let (_, reply) = body(register(&ctx, "alice", &public_key).await).await;
    assert!(reply.success);

    // Never-issued challenge.
    let bogus = STANDARD.encode([1u8; 32]);
    let case_unknown_challenge =
        body(login(&ctx, &public_key, &bogus, &sign_challenge(&key, &bogus)).await).await;

    // Expired challenge.
    let stale = ctx
        .challenges
        .issue_expiring_at(Utc::now() - TimeDelta::seconds(1));
    let case_expired =
        body(login(&ctx, &public_key, &stale, &sign_challenge(&key, &stale)).await).await;

    // Unknown user with a perfectly fresh challenge.
    let fresh = ctx.challenges.issue();
    let case_unknown_user = body(
        login(&ctx, &unknown_key, &fresh, &sign_challenge(&stranger, &fresh)).await,
    )
    .await;

    // Known user, wrong key.
    let fresh = ctx.challenges.issue();
    let case_bad_signature = body(
        login(&ctx, &public_key, &fresh, &sign_challenge(&stranger, &fresh)).await,
    )
    .await;

    for (status, reply) in [
        case_unknown_challenge,
        case_expired,
        case_unknown_user,
        case_bad_signature,
    ] {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!reply.success);
        assert_eq!(reply.message, "authentication failed");
        assert_eq!(reply.data, Value::Null);
    }
}

#[tokio::test]
async fn test_challenges_are_single_use_across_logins() {
    let ctx = memory_context().await;
    let key = SigningKey::from_bytes(&[9u8; 32]);
    let public_key = STANDARD.encode(key.verifying_key().to_bytes());
    let (_, reply) = body(register(&ctx, "alice", &public_key).await).await;
    assert!(reply.success);

    let (_, reply) = body(http::challenge(State(Arc::clone(&ctx))).await).await;
    let challenge = reply.data.as_str().expect("nonce").to_string();
    let signature = sign_challenge(&key, &challenge);

    let (status, _) = body(login(&ctx, &public_key, &challenge, &signature).await).await;
    assert_eq!(status, StatusCode::OK);

    // Replaying the same challenge must fail like any other bad login.
    let (status, reply) = body(login(&ctx, &public_key, &challenge, &signature).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message, "authentication failed");
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = memory_context().await;

    let (status, reply) = body(register(&ctx, "", "pk-alice").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message, "username and public key are required");

    let (_, reply) = body(register(&ctx, "alice", "pk-alice").await).await;
    assert!(reply.success);

    let (status, reply) = body(register(&ctx, "alice", "pk-other").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message, "username or public key already taken");
}

#[tokio::test]
async fn test_reply_codes_increase_monotonically() {
    let ctx = memory_context().await;

    let (_, first) = body(http::challenge(State(Arc::clone(&ctx))).await).await;
    let (_, second) = body(http::challenge(State(Arc::clone(&ctx))).await).await;
    assert!(second.code > first.code);
}
