// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    error::ServerError,
    models::{
        transaction::{FileInfo, Transaction, TransactionTarget},
        user::MinimalUser,
    },
};

/// Result of a target answering a share offer. The snapshot is taken after
/// the status transition so callers can notify from it without re-reading.
#[derive(Debug, Clone)]
pub struct ResponseOutcome {
    pub transaction: Transaction,
    pub accepted: bool,
}

/// Registry of live transactions under one readers–writer lock.
///
/// Authorization is positional: mutations of targets, files, and lifecycle
/// only for the sender; a status transition only for the target it names.
/// Every method returns a snapshot, never a reference into the map.
#[derive(Debug, Default)]
pub struct TransactionManager {
    inner: RwLock<HashMap<String, Transaction>>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty transaction owned by `sender`.
    pub async fn create(&self, sender: MinimalUser) -> Transaction {
        let transaction = Transaction::new(sender);
        self.inner
            .write()
            .await
            .insert(transaction.id.clone(), transaction.clone());
        transaction
    }

    pub async fn get(&self, id: &str) -> Option<Transaction> {
        self.inner.read().await.get(id).cloned()
    }

    /// Removes the transaction. Sender-only; the removed snapshot still
    /// carries the target list so callers can notify.
    pub async fn delete(
        &self,
        id: &str,
        requester_key: &str,
    ) -> Result<Transaction, ServerError> {
        let mut transactions = self.inner.write().await;
        let transaction = transactions
            .remove(id)
            .ok_or(ServerError::NotFound("transaction"))?;
        if !transaction.is_sender(requester_key) {
            transactions.insert(transaction.id.clone(), transaction);
            return Err(ServerError::Unauthorized);
        }
        Ok(transaction)
    }

    /// Replaces the target set with `targets`, all Pending. Sender-only.
    pub async fn set_targets(
        &self,
        id: &str,
        requester_key: &str,
        targets: Vec<MinimalUser>,
    ) -> Result<Transaction, ServerError> {
        if targets.is_empty() {
            return Err(ServerError::MalformedInput);
        }

        let mut transactions = self.inner.write().await;
        let transaction = transactions
            .get_mut(id)
            .ok_or(ServerError::NotFound("transaction"))?;
        if !transaction.is_sender(requester_key) {
            return Err(ServerError::Unauthorized);
        }
        if transaction.started {
            return Err(ServerError::AlreadyStarted);
        }

        transaction.targets = targets
            .into_iter()
            .map(TransactionTarget::pending)
            .collect();
        Ok(transaction.clone())
    }

    /// Stores the offered file set. Sender-only; empty sets are rejected.
    pub async fn set_files(
        &self,
        id: &str,
        requester_key: &str,
        files: Vec<FileInfo>,
    ) -> Result<Transaction, ServerError> {
        if files.is_empty() {
            return Err(ServerError::MalformedInput);
        }

        let mut transactions = self.inner.write().await;
        let transaction = transactions
            .get_mut(id)
            .ok_or(ServerError::NotFound("transaction"))?;
        if !transaction.is_sender(requester_key) {
            return Err(ServerError::Unauthorized);
        }
        if transaction.started {
            return Err(ServerError::AlreadyStarted);
        }

        transaction.files = files;
        Ok(transaction.clone())
    }

    /// Records a target's accept/decline.
    ///
    /// Fails when the transaction is absent, already started, the requester
    /// is not a target, or the target already answered.
    pub async fn respond(
        &self,
        id: &str,
        responder_key: &str,
        accept: bool,
    ) -> Result<ResponseOutcome, ServerError> {
        let mut transactions = self.inner.write().await;
        let transaction = transactions
            .get_mut(id)
            .ok_or(ServerError::NotFound("transaction"))?;
        if transaction.started {
            return Err(ServerError::AlreadyStarted);
        }

        let target = transaction
            .target_mut(responder_key)
            .ok_or(ServerError::Unauthorized)?;
        target.respond(accept)?;

        Ok(ResponseOutcome {
            transaction: transaction.clone(),
            accepted: accept,
        })
    }

    /// Freezes the accepted targets and marks the transaction started.
    /// Sender-only; the returned snapshot holds only accepted targets in
    /// their original order.
    pub async fn start(
        &self,
        id: &str,
        requester_key: &str,
    ) -> Result<Transaction, ServerError> {
        let mut transactions = self.inner.write().await;
        let transaction = transactions
            .get_mut(id)
            .ok_or(ServerError::NotFound("transaction"))?;
        if !transaction.is_sender(requester_key) {
            return Err(ServerError::Unauthorized);
        }
        if transaction.started {
            return Err(ServerError::AlreadyStarted);
        }

        transaction.freeze_accepted();
        Ok(transaction.clone())
    }

    /// Sender-only view of the current target list.
    pub async fn targets(
        &self,
        id: &str,
        requester_key: &str,
    ) -> Result<Vec<TransactionTarget>, ServerError> {
        let transactions = self.inner.read().await;
        let transaction = transactions
            .get(id)
            .ok_or(ServerError::NotFound("transaction"))?;
        if !transaction.is_sender(requester_key) {
            return Err(ServerError::Unauthorized);
        }
        Ok(transaction.targets.clone())
    }

    /// Drops every transaction owned by `sender_key`, returning the removed
    /// snapshots so teardown can notify their targets.
    pub async fn remove_by_sender(&self, sender_key: &str) -> Vec<Transaction> {
        let mut transactions = self.inner.write().await;
        let ids: Vec<String> = transactions
            .values()
            .filter(|t| t.is_sender(sender_key))
            .map(|t| t.id.clone())
            .collect();

        ids.iter()
            .filter_map(|id| transactions.remove(id))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
