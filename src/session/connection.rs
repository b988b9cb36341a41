// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::{
    message::{Envelope, WsKind},
    user::{MinimalUser, User},
};

/// RFC 6455 policy-violation close code, used for token expiry and
/// session takeover.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Upper bound on queued outbound frames. A peer that falls this far
/// behind is dropped rather than allowed to stall its producers.
pub const OUTBOUND_QUEUE: usize = 64;

/// A frame on its way to one connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Frame(Envelope),
    Close { code: u16, reason: String },
}

/// The live, authenticated per-connection record.
///
/// All writes to the underlying socket funnel through the bounded outbound
/// queue; producers never block, so any handler may send while holding a
/// registry lock. The cancellation token tears down the read loop and the
/// expiry watcher together.
#[derive(Debug)]
pub struct Session {
    id: u64,
    /// Immutable for the session's lifetime; the registry key for takeover.
    pub public_key: String,
    /// Store primary key, immutable.
    pub user_id: i64,
    pub token_expiry: DateTime<Utc>,
    user: RwLock<User>,
    outbound: mpsc::Sender<Outbound>,
    cancel: CancellationToken,
}

impl Session {
    /// Builds a session and hands back the receiving end of its outbound
    /// queue for the connection's writer task.
    pub fn new(
        id: u64,
        user: User,
        token_expiry: DateTime<Utc>,
    ) -> (Arc<Self>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        let session = Arc::new(Self {
            id,
            public_key: user.public_key.clone(),
            user_id: user.id,
            token_expiry,
            user: RwLock::new(user),
            outbound: tx,
            cancel: CancellationToken::new(),
        });
        (session, rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn user(&self) -> User {
        self.user.read().await.clone()
    }

    pub async fn minimal(&self) -> MinimalUser {
        self.user.read().await.minimal()
    }

    pub async fn username(&self) -> String {
        self.user.read().await.username.clone()
    }

    pub async fn is_discoverable(&self) -> bool {
        self.user.read().await.is_discoverable
    }

    pub async fn set_username(&self, username: String) {
        self.user.write().await.username = username;
    }

    pub async fn set_discoverable(&self, discoverable: bool) {
        self.user.write().await.is_discoverable = discoverable;
    }

    /// Queues one frame. A full queue means the peer stopped draining;
    /// the session is cancelled so the dispatch loop tears it down.
    pub fn send(&self, kind: WsKind, data: impl Serialize) {
        self.push(Outbound::Frame(Envelope::new(kind, data)));
    }

    pub fn send_error(&self, reason: impl Into<String>) {
        self.push(Outbound::Frame(Envelope::error(reason)));
    }

    /// Queues a close frame and cancels the session. The writer task still
    /// drains everything queued ahead of the close.
    pub fn close(&self, code: u16, reason: &str) {
        self.push(Outbound::Close {
            code,
            reason: reason.to_string(),
        });
        self.cancel.cancel();
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn push(&self, out: Outbound) {
        match self.outbound.try_send(out) {
            Ok(()) => {},
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(session = self.id, "outbound queue full, dropping connection");
                self.cancel.cancel();
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(session = self.id, "send after writer exit");
            },
        }
    }
}
