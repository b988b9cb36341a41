// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::{
    error::ServerError,
    handlers::parse,
    models::message::{
        AcceptNotification, DeclineNotification, ShareFilesRequest, ShareInvite,
        ShareResponse, ShareTargetsRequest, StartNotice, StartRequest, WsKind,
    },
    models::transaction::Transaction,
    server::Context,
    session::connection::Session,
};

/// NEW_TRANSACTION: create an empty transaction owned by the caller and
/// echo the snapshot back.
pub async fn create(ctx: &Context, session: &Arc<Session>) {
    let transaction = ctx.transactions.create(session.minimal().await).await;
    debug!(session = session.id(), transaction = %transaction.id, "transaction created");
    session.send(WsKind::NewTransaction, transaction);
}

/// INFO_TRANSACTION: current snapshot if present, otherwise a delete
/// notice for the queried id.
pub async fn info(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(id) = parse::<String>(session, data) else {
        return;
    };

    match ctx.transactions.get(&id).await {
        Some(transaction) => session.send(WsKind::InfoTransaction, transaction),
        None => session.send(WsKind::DeleteTransaction, id),
    }
}

/// DELETE_TRANSACTION: sender-only removal, then delete notices to every
/// captured target and to the sender.
pub async fn delete(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(id) = parse::<String>(session, data) else {
        return;
    };

    match ctx.transactions.delete(&id, &session.public_key).await {
        Ok(removed) => {
            notify_targets_deleted(ctx, &removed).await;
            session.send(WsKind::DeleteTransaction, &removed.id);
        },
        Err(e) => session.send_error(e.to_string()),
    }
}

/// USER_SHARE_TARGET: resolve the requested keys against the live registry
/// (input order kept, unresolved keys skipped), replace the target set, and
/// offer the transaction to every resolved target.
pub async fn share_targets(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(req) = parse::<ShareTargetsRequest>(session, data) else {
        return;
    };

    let mut peers = Vec::with_capacity(req.public_keys.len());
    for key in &req.public_keys {
        match ctx.sessions.by_public_key(key).await {
            Some(peer) => peers.push(peer),
            None => debug!(target = %key, "skipping disconnected share target"),
        }
    }
    if peers.is_empty() {
        session.send_error("no connected targets for this transaction");
        return;
    }

    let mut projections = Vec::with_capacity(peers.len());
    for peer in &peers {
        projections.push(peer.minimal().await);
    }

    match ctx
        .transactions
        .set_targets(&req.transaction_id, &session.public_key, projections)
        .await
    {
        Ok(snapshot) => {
            let sender = session.username().await;
            for peer in &peers {
                peer.send(
                    WsKind::TransactionShareAccept,
                    ShareInvite {
                        transaction: snapshot.clone(),
                        sender: sender.clone(),
                    },
                );
            }
            session.send(WsKind::UserShareTarget, snapshot);
        },
        Err(e) => session.send_error(e.to_string()),
    }
}

/// FILE_SHARE_TARGET: sender-only attachment of the offered file set.
pub async fn share_files(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(req) = parse::<ShareFilesRequest>(session, data) else {
        return;
    };
    if req.files.is_empty() {
        session.send_error("no files provided");
        return;
    }

    match ctx
        .transactions
        .set_files(&req.transaction_id, &session.public_key, req.files)
        .await
    {
        Ok(_) => session.send(WsKind::FileShareTarget, "files added to transaction"),
        Err(e) => session.send_error(e.to_string()),
    }
}

/// TRANSACTION_SHARE_ACCEPT: record a target's answer.
///
/// An accepting target is acked, the sender notified, and the start payload
/// pushed to the acceptor right away so a late accept cannot miss a
/// broadcast that already happened. A duplicate answer gets the recorded
/// ack back without any mutation.
pub async fn respond(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(req) = parse::<ShareResponse>(session, data) else {
        return;
    };

    let outcome = match ctx
        .transactions
        .respond(&req.transaction_id, &session.public_key, req.accept)
        .await
    {
        Ok(outcome) => outcome,
        Err(ServerError::DuplicateResponse) => {
            session.send(WsKind::TransactionShareAccept, "response already recorded");
            return;
        },
        Err(e) => {
            session.send_error(e.to_string());
            return;
        },
    };

    let responder = session.minimal().await;
    let transaction = &outcome.transaction;

    if outcome.accepted {
        session.send(WsKind::TransactionShareAccept, "response recorded");
        if let Some(sender) = ctx
            .sessions
            .by_public_key(&transaction.sender.public_key)
            .await
        {
            sender.send(
                WsKind::TransactionShareAccept,
                AcceptNotification::new(&responder, transaction.id.clone()),
            );
        }
        session.send(WsKind::StartTransaction, start_notice(transaction));
    } else if let Some(sender) = ctx
        .sessions
        .by_public_key(&transaction.sender.public_key)
        .await
    {
        sender.send(
            WsKind::TransactionShareAccept,
            DeclineNotification::new(
                &responder,
                transaction.id.clone(),
                req.reason.unwrap_or_default(),
            ),
        );
    }
}

/// START_TRANSACTION: freeze the accepted targets and broadcast the start
/// payload to each of them, in target order.
pub async fn start(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(req) = parse::<StartRequest>(session, data) else {
        return;
    };

    match ctx
        .transactions
        .start(&req.transaction_id, &session.public_key)
        .await
    {
        Ok(snapshot) => {
            let notice = start_notice(&snapshot);
            for target in &snapshot.targets {
                if let Some(peer) =
                    ctx.sessions.by_public_key(&target.user.public_key).await
                {
                    peer.send(WsKind::StartTransaction, notice.clone());
                }
            }
            session.send(WsKind::StartTransaction, "transaction started");
        },
        Err(e) => session.send_error(e.to_string()),
    }
}

/// TRANSACTION_HOST_RECV: sender-only view of the current target list.
pub async fn host_targets(ctx: &Context, session: &Arc<Session>, data: Value) {
    let Some(req) = parse::<StartRequest>(session, data) else {
        return;
    };

    match ctx
        .transactions
        .targets(&req.transaction_id, &session.public_key)
        .await
    {
        Ok(targets) => session.send(WsKind::TransactionHostRecv, targets),
        Err(e) => session.send_error(e.to_string()),
    }
}

/// Delete notices for every still-connected target of a removed
/// transaction. Shared with session teardown for orphan collection.
pub async fn notify_targets_deleted(ctx: &Context, removed: &Transaction) {
    for target in &removed.targets {
        if let Some(peer) = ctx.sessions.by_public_key(&target.user.public_key).await {
            peer.send(WsKind::DeleteTransaction, &removed.id);
        }
    }
}

fn start_notice(transaction: &Transaction) -> StartNotice {
    StartNotice {
        transaction_id: transaction.id.clone(),
        sender: transaction.sender.username.clone(),
        files: transaction.files.clone(),
    }
}
