// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The bidirectional message channel: token-authenticated upgrade,
//! admission into the session registry, the per-session dispatch loop, and
//! teardown.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{CloseFrame, Message, WebSocket},
    },
    response::Response,
};
use chrono::Utc;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    auth::token::Claims,
    handlers,
    models::message::Envelope,
    server::{Context, http::AuthClaims},
    session::connection::{CLOSE_POLICY_VIOLATION, Outbound, Session},
};

pub async fn upgrade(
    State(ctx): State<Arc<Context>>,
    AuthClaims(claims): AuthClaims,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| drive_session(ctx, claims, socket))
}

/// Runs one authenticated connection from admission to teardown.
async fn drive_session(ctx: Arc<Context>, claims: Claims, mut socket: WebSocket) {
    // The token is valid, but the identity must still exist in the store.
    let user = match ctx.store.find_by_public_key(&claims.public_key).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "rejecting channel for unknown identity");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_POLICY_VIOLATION,
                    reason: "unknown identity".into(),
                })))
                .await;
            return;
        },
    };

    let (sink, stream) = socket.split();
    let id = ctx.sessions.allocate_id();
    let (session, outbound) = Session::new(id, user, claims.expiry());

    ctx.sessions.admit(Arc::clone(&session), &ctx.cache).await;
    if session.is_discoverable().await {
        if ctx.cache.is_empty().await {
            ctx.cache.rebuild_from(ctx.sessions.snapshot().await).await;
        } else {
            ctx.cache.add(Arc::clone(&session)).await;
        }
    }

    let writer = tokio::spawn(write_loop(sink, outbound));
    let watcher = spawn_expiry_watcher(Arc::clone(&session));
    info!(session = id, user = %session.public_key, "session opened");

    read_loop(&ctx, &session, stream).await;

    teardown(&ctx, &session).await;

    // The writer drains until every queue sender is gone.
    drop(session);
    let _ = watcher.await;
    let _ = writer.await;
}

/// Reads frames until the peer closes, the transport fails, or the session
/// is cancelled. Malformed frames are answered with ERROR and the loop
/// keeps going.
async fn read_loop(
    ctx: &Arc<Context>,
    session: &Arc<Session>,
    mut stream: SplitStream<WebSocket>,
) {
    let cancel = session.cancel_token();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            incoming = stream.next() => {
                let Some(result) = incoming else { break };
                let message = match result {
                    Ok(message) => message,
                    Err(e) => {
                        debug!(session = session.id(), error = %e, "read failed");
                        break;
                    },
                };
                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<Envelope>(text.as_str()) {
                            Ok(frame) => handlers::dispatch(ctx, session, frame).await,
                            Err(e) => {
                                session.send_error(format!("malformed message: {e}"))
                            },
                        }
                    },
                    Message::Close(_) => break,
                    // Pings are answered by the transport; binary frames are
                    // not part of the protocol.
                    _ => {},
                }
            }
        }
    }
}

/// Sole writer for one connection. Frames leave in queue order; a close
/// frame is the last thing sent.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    while let Some(out) = outbound.recv().await {
        match out {
            Outbound::Frame(frame) => {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(error = %e, "failed to serialize outbound frame");
                        continue;
                    },
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            },
            Outbound::Close { code, reason } => {
                let _ = sink
                    .send(Message::Close(Some(CloseFrame {
                        code,
                        reason: reason.into(),
                    })))
                    .await;
                break;
            },
        }
    }
}

/// Closes the connection the moment its token expires. Exits quietly when
/// the session ends first.
fn spawn_expiry_watcher(session: Arc<Session>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let until = (session.token_expiry - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let cancel = session.cancel_token();
        tokio::select! {
            _ = cancel.cancelled() => {},
            _ = tokio::time::sleep(until) => {
                debug!(session = session.id(), "session token expired");
                session.close(CLOSE_POLICY_VIOLATION, "jwt expired");
            },
        }
    })
}

/// Removes the session from the shared registries and collects the
/// transactions it still owned. A session that was already replaced by a
/// newer connection for the same key leaves the replacement untouched.
async fn teardown(ctx: &Arc<Context>, session: &Arc<Session>) {
    session.cancel();

    let removed = ctx.sessions.remove(session.id(), &ctx.cache).await;
    if removed.is_some() {
        let orphaned = ctx
            .transactions
            .remove_by_sender(&session.public_key)
            .await;
        for transaction in &orphaned {
            handlers::transaction::notify_targets_deleted(ctx, transaction).await;
        }
        if !orphaned.is_empty() {
            debug!(
                session = session.id(),
                count = orphaned.len(),
                "dropped orphaned transactions"
            );
        }
    }

    info!(session = session.id(), "session closed");
}
