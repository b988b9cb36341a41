// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! REST surface: registration, challenge/login, rename, network probe.
//!
//! Every endpoint answers the common envelope
//! `{success, message, code, data}`. The login path collapses every
//! authentication failure kind into one indistinguishable reply so callers
//! cannot probe which step failed.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, State, rejection::JsonRejection},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    auth::{signature::verify_signature, token},
    error::ServerError,
    server::{Context, network},
};

/// Common response envelope. `code` is the per-process reply counter.
#[derive(Debug, Serialize, Deserialize)]
pub struct Reply {
    pub success: bool,
    pub message: String,
    pub code: u64,
    pub data: Value,
}

fn reply(
    ctx: &Context,
    status: StatusCode,
    success: bool,
    message: impl Into<String>,
    data: impl Serialize,
) -> Response {
    let body = Reply {
        success,
        message: message.into(),
        code: ctx.next_reply_code(),
        data: serde_json::to_value(data).unwrap_or(Value::Null),
    };
    (status, Json(body)).into_response()
}

fn auth_failed(ctx: &Context) -> Response {
    reply(
        ctx,
        StatusCode::BAD_REQUEST,
        false,
        "authentication failed",
        Value::Null,
    )
}

pub async fn root() -> &'static str {
    "Server is online"
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterBody {
    pub username: String,
    pub public_key: String,
}

pub async fn register(
    State(ctx): State<Arc<Context>>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return reply(
            &ctx,
            StatusCode::BAD_REQUEST,
            false,
            "invalid body",
            Value::Null,
        );
    };
    if body.username.is_empty() || body.public_key.is_empty() {
        return reply(
            &ctx,
            StatusCode::BAD_REQUEST,
            false,
            "username and public key are required",
            Value::Null,
        );
    }

    match ctx.store.create_user(&body.username, &body.public_key).await {
        Ok(user) => reply(&ctx, StatusCode::OK, true, "user", user),
        Err(e @ ServerError::Conflict) => {
            reply(&ctx, StatusCode::BAD_REQUEST, false, e.to_string(), Value::Null)
        },
        Err(e) => {
            error!(error = %e, "registration failed");
            reply(
                &ctx,
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "store failure",
                Value::Null,
            )
        },
    }
}

pub async fn challenge(State(ctx): State<Arc<Context>>) -> Response {
    let nonce = ctx.challenges.issue();
    reply(&ctx, StatusCode::OK, true, "challenge", nonce)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginBody {
    pub public_key: String,
    pub challenge: String,
    pub signature: String,
}

pub async fn login(
    State(ctx): State<Arc<Context>>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return reply(
            &ctx,
            StatusCode::BAD_REQUEST,
            false,
            "invalid body",
            Value::Null,
        );
    };

    match try_login(&ctx, &body).await {
        Ok(token) => reply(&ctx, StatusCode::OK, true, "login success", token),
        Err(e) if e.is_auth_failure() => {
            // One reply for unknown challenge, expired challenge, unknown
            // user, and bad signature alike.
            debug!(error = %e, "login refused");
            auth_failed(&ctx)
        },
        Err(e) => {
            error!(error = %e, "login failed");
            reply(
                &ctx,
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "store failure",
                Value::Null,
            )
        },
    }
}

async fn try_login(ctx: &Context, body: &LoginBody) -> Result<String, ServerError> {
    let expiry = ctx
        .challenges
        .consume(&body.challenge)
        .ok_or(ServerError::NotFound("challenge"))?;
    if expiry < Utc::now() {
        return Err(ServerError::Expired("challenge"));
    }

    let user = ctx.store.find_by_public_key(&body.public_key).await?;

    if !verify_signature(&user.public_key, &body.challenge, &body.signature)? {
        return Err(ServerError::Unauthorized);
    }

    token::mint(&ctx.cfg.server_secret, &user.username, &user.public_key)
}

/// Verified claims of the calling identity, from `Authorization: Bearer`
/// or the `token` query parameter.
pub struct AuthClaims(pub token::Claims);

impl FromRequestParts<Arc<Context>> for AuthClaims {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<Context>,
    ) -> Result<Self, Self::Rejection> {
        let Some(raw) = bearer_token(parts) else {
            return Err(unauthorized(ctx));
        };
        match token::verify(&ctx.cfg.server_secret, &raw) {
            Ok(claims) => Ok(Self(claims)),
            Err(e) => {
                debug!(error = %e, "token rejected");
                Err(unauthorized(ctx))
            },
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION)
        && let Ok(value) = value.to_str()
        && let Some(raw) = value.strip_prefix("Bearer ")
    {
        return Some(raw.to_string());
    }
    parts
        .uri
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .map(str::to_string)
}

fn unauthorized(ctx: &Context) -> Response {
    reply(
        ctx,
        StatusCode::UNAUTHORIZED,
        false,
        "invalid or expired token",
        Value::Null,
    )
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RenameBody {
    pub username: String,
}

/// Renames the calling identity; a live session picks the new name up
/// immediately.
pub async fn rename(
    State(ctx): State<Arc<Context>>,
    AuthClaims(claims): AuthClaims,
    body: Result<Json<RenameBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return reply(
            &ctx,
            StatusCode::BAD_REQUEST,
            false,
            "invalid body",
            Value::Null,
        );
    };
    if body.username.is_empty() {
        return reply(
            &ctx,
            StatusCode::BAD_REQUEST,
            false,
            "username is required",
            Value::Null,
        );
    }

    match ctx
        .store
        .update_username(&claims.public_key, &body.username)
        .await
    {
        Ok(user) => {
            if let Some(session) = ctx.sessions.by_public_key(&claims.public_key).await
            {
                session.set_username(user.username.clone()).await;
            }
            reply(&ctx, StatusCode::OK, true, "user", user)
        },
        Err(e @ (ServerError::Conflict | ServerError::NotFound(_))) => {
            reply(&ctx, StatusCode::BAD_REQUEST, false, e.to_string(), Value::Null)
        },
        Err(e) => {
            error!(error = %e, "rename failed");
            reply(
                &ctx,
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "store failure",
                Value::Null,
            )
        },
    }
}

pub async fn network_ssid(State(ctx): State<Arc<Context>>) -> Response {
    reply(
        &ctx,
        StatusCode::OK,
        true,
        "network",
        network::current_ssid().await,
    )
}
