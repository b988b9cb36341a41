// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{models::user::MinimalUser, session::connection::Session};

/// Ordered snapshot of currently-connected, discoverable sessions.
///
/// Membership is the contract: an entry implies the session is registered
/// and its user opted in. Order is insertion order, but removal swaps with
/// the last element, so readers must not rely on it.
#[derive(Debug, Default)]
pub struct DiscoverabilityCache {
    inner: RwLock<Vec<Arc<Session>>>,
}

impl DiscoverabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cache with the discoverable subset of `sessions`.
    pub async fn rebuild_from(&self, sessions: Vec<Arc<Session>>) {
        let mut fresh = Vec::with_capacity(sessions.len());
        for session in sessions {
            if session.is_discoverable().await {
                fresh.push(session);
            }
        }
        *self.inner.write().await = fresh;
    }

    /// Appends the session if its user opted in and is not already cached.
    pub async fn add(&self, session: Arc<Session>) {
        if !session.is_discoverable().await {
            return;
        }
        let mut cached = self.inner.write().await;
        if cached.iter().any(|s| s.user_id == session.user_id) {
            return;
        }
        cached.push(session);
    }

    /// Excises the entry for `user_id`, if any.
    pub async fn remove(&self, user_id: i64) {
        let mut cached = self.inner.write().await;
        if let Some(pos) = cached.iter().position(|s| s.user_id == user_id) {
            cached.swap_remove(pos);
        }
    }

    pub async fn snapshot(&self) -> Vec<Arc<Session>> {
        self.inner.read().await.clone()
    }

    /// The peer-listing projection sent as USER_SHARE_LIST.
    pub async fn listing(&self) -> Vec<MinimalUser> {
        let cached = self.inner.read().await.clone();
        let mut out = Vec::with_capacity(cached.len());
        for session in cached {
            out.push(session.minimal().await);
        }
        out
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
