// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use serde_json::Value;

use crate::{
    handlers::parse,
    models::message::{SignalForward, SignalRequest, WsKind},
    server::Context,
    session::connection::Session,
};

/// WEBRTC_SIGNAL: forward the opaque payload to the session holding
/// `target_key`, rewritten so the receiver learns the origin key. The relay
/// keeps no state and does not validate the transaction id.
pub async fn relay(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(req) = parse::<SignalRequest>(session, data) else {
        return;
    };

    match ctx.sessions.by_public_key(&req.target_key).await {
        Some(peer) => peer.send(
            WsKind::WebrtcSignal,
            SignalForward {
                transaction_id: req.transaction_id,
                from_key: session.public_key.clone(),
                data: req.data,
            },
        ),
        None => session.send_error("target user not found or not connected"),
    }
}
