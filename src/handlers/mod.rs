//! Per-message handlers behind the dispatch loop.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Discoverability toggle, rename, and user-info queries.
pub mod config;
/// Peer-listing replies.
pub mod sharing;
/// Opaque peer-connection signaling relay.
pub mod signal;
/// Transaction lifecycle operations.
pub mod transaction;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    models::message::{Envelope, WsKind},
    server::Context,
    session::connection::Session,
};

/// Routes one decoded frame. Unknown tags are dropped without a reply;
/// per-message failures go back as ERROR frames and never end the session.
pub async fn dispatch(ctx: &Context, session: &Arc<Session>, frame: Envelope) {
    let Some(kind) = WsKind::from_u8(frame.kind) else {
        debug!(session = session.id(), kind = frame.kind, "ignoring unknown message kind");
        return;
    };

    debug!(session = session.id(), ?kind, "dispatching");
    match kind {
        // Egress-only tags carry nothing for the server to do.
        WsKind::None | WsKind::Error | WsKind::UserShareList => {
            debug!(session = session.id(), ?kind, "ignoring egress-only kind");
        },
        WsKind::ConfigDiscoverable => {
            config::set_discoverable(ctx, session, frame.data).await
        },
        WsKind::StartSharing => sharing::start_sharing(ctx, session).await,
        WsKind::NewTransaction => transaction::create(ctx, session).await,
        WsKind::InfoTransaction => transaction::info(ctx, session, frame.data).await,
        WsKind::DeleteTransaction => transaction::delete(ctx, session, frame.data).await,
        WsKind::UserShareTarget => {
            transaction::share_targets(ctx, session, frame.data).await
        },
        WsKind::FileShareTarget => {
            transaction::share_files(ctx, session, frame.data).await
        },
        WsKind::StartTransaction => transaction::start(ctx, session, frame.data).await,
        WsKind::TransactionShareAccept => {
            transaction::respond(ctx, session, frame.data).await
        },
        WsKind::WebrtcSignal => signal::relay(ctx, session, frame.data).await,
        WsKind::UserInfo => config::user_info(session).await,
        WsKind::ConfigName => config::rename(ctx, session, frame.data).await,
        WsKind::TransactionHostRecv => {
            transaction::host_targets(ctx, session, frame.data).await
        },
    }
}

/// Decodes a payload, answering the session with ERROR on mismatch.
pub(crate) fn parse<T: DeserializeOwned>(session: &Session, data: Value) -> Option<T> {
    match serde_json::from_value(data) {
        Ok(v) => Some(v),
        Err(e) => {
            session.send_error(format!("malformed payload: {e}"));
            None
        },
    }
}
