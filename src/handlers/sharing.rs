// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use crate::{models::message::WsKind, server::Context, session::connection::Session};

/// START_SHARING: reply with the discoverable-peer listing, rebuilding the
/// cache from the registry on first use.
pub async fn start_sharing(ctx: &Context, session: &Arc<Session>) {
    if ctx.cache.is_empty().await {
        ctx.cache.rebuild_from(ctx.sessions.snapshot().await).await;
    }
    session.send(WsKind::UserShareList, ctx.cache.listing().await);
}
