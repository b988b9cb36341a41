// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::{
    error::ServerError,
    handlers::parse,
    models::message::WsKind,
    server::Context,
    session::connection::Session,
};

/// CONFIG_DISCOVERABLE: persist the flag, mirror it on the session, and
/// fix up the discoverability cache. Store failures are reported without
/// ending the session.
pub async fn set_discoverable(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(discoverable) = parse::<bool>(session, data) else {
        return;
    };

    if let Err(e) = ctx
        .store
        .set_discoverable(&session.public_key, discoverable)
        .await
    {
        warn!(session = session.id(), error = %e, "discoverability update failed");
        session.send_error(format!("failed to persist discoverability: {e}"));
        return;
    }

    session.set_discoverable(discoverable).await;
    if discoverable {
        if ctx.cache.is_empty().await {
            ctx.cache.rebuild_from(ctx.sessions.snapshot().await).await;
        }
        ctx.cache.add(Arc::clone(session)).await;
    } else {
        ctx.cache.remove(session.user_id).await;
    }

    session.send(WsKind::ConfigDiscoverable, "success");
}

/// CONFIG_NAME: persist the rename and update the live projection.
pub async fn rename(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(username) = parse::<String>(session, data) else {
        return;
    };
    if username.is_empty() {
        session.send_error("username must not be empty");
        return;
    }

    match ctx
        .store
        .update_username(&session.public_key, &username)
        .await
    {
        Ok(_) => {
            session.set_username(username).await;
            session.send(WsKind::ConfigName, "success");
        },
        Err(e @ ServerError::Conflict) => session.send_error(e.to_string()),
        Err(e) => {
            warn!(session = session.id(), error = %e, "rename failed");
            session.send_error(format!("failed to persist rename: {e}"));
        },
    }
}

/// USER_INFO: reply with the caller's full record.
pub async fn user_info(session: &Arc<Session>) {
    session.send(WsKind::UserInfo, session.user().await);
}
