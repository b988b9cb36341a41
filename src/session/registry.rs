// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::RwLock;
use tracing::info;

use crate::session::{
    cache::DiscoverabilityCache,
    connection::{CLOSE_POLICY_VIOLATION, Session},
};

/// Live sessions keyed by connection id, at most one per public key.
///
/// Lock order across the shared registries is challenge → session →
/// discoverability → transaction; methods here may take the cache lock
/// while holding the session lock, never the reverse.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    inner: RwLock<HashMap<u64, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out connection ids; ids also encode admission order.
    pub fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Admits an authenticated session.
    ///
    /// If the public key is already sessioned, the prior connection gets a
    /// policy-violation close, leaves the discoverability cache, and is
    /// replaced. The evicted session is returned for logging.
    pub async fn admit(
        &self,
        session: Arc<Session>,
        cache: &DiscoverabilityCache,
    ) -> Option<Arc<Session>> {
        let mut sessions = self.inner.write().await;

        let prior = sessions
            .iter()
            .find(|(_, s)| s.public_key == session.public_key)
            .map(|(id, s)| (*id, Arc::clone(s)));

        if let Some((prior_id, prior)) = &prior {
            prior.close(CLOSE_POLICY_VIOLATION, "session replaced");
            cache.remove(prior.user_id).await;
            sessions.remove(prior_id);
            info!(
                session = prior.id(),
                replacement = session.id(),
                "session replaced by a newer connection"
            );
        }

        sessions.insert(session.id(), session);
        prior.map(|(_, s)| s)
    }

    /// Removes a session and its cache entry on teardown.
    pub async fn remove(
        &self,
        id: u64,
        cache: &DiscoverabilityCache,
    ) -> Option<Arc<Session>> {
        let mut sessions = self.inner.write().await;
        let removed = sessions.remove(&id)?;
        cache.remove(removed.user_id).await;
        Some(removed)
    }

    pub async fn by_public_key(&self, public_key: &str) -> Option<Arc<Session>> {
        self.inner
            .read()
            .await
            .values()
            .find(|s| s.public_key == public_key)
            .cloned()
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.inner.read().await.contains_key(&id)
    }

    /// All live sessions in admission order.
    pub async fn snapshot(&self) -> Vec<Arc<Session>> {
        let sessions = self.inner.read().await;
        let mut out: Vec<Arc<Session>> = sessions.values().cloned().collect();
        out.sort_by_key(|s| s.id());
        out
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
