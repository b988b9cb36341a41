// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A transaction is a sender-owned offer of a file set to one or more
//! targets. Targets consent independently; starting the transaction freezes
//! the target list to the accepting subset.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ServerError, models::user::MinimalUser};

/// Consent state of a single target.
///
/// ```text
/// Pending ──accept──► Accepted ──(start)──► retained
///         └─decline─► Declined ──(start)──► dropped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionTarget {
    pub user: MinimalUser,
    pub status: TargetStatus,
}

impl TransactionTarget {
    pub fn pending(user: MinimalUser) -> Self {
        Self {
            user,
            status: TargetStatus::Pending,
        }
    }

    /// Records the target's answer. The status moves at most once.
    pub fn respond(&mut self, accept: bool) -> Result<(), ServerError> {
        if self.status != TargetStatus::Pending {
            return Err(ServerError::DuplicateResponse);
        }
        self.status = if accept {
            TargetStatus::Accepted
        } else {
            TargetStatus::Declined
        };
        Ok(())
    }
}

/// File metadata only; contents travel peer-to-peer, never through here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub mime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub sender: MinimalUser,
    pub targets: Vec<TransactionTarget>,
    pub files: Vec<FileInfo>,
    pub started: bool,
}

impl Transaction {
    pub fn new(sender: MinimalUser) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            targets: Vec::new(),
            files: Vec::new(),
            started: false,
        }
    }

    pub fn is_sender(&self, public_key: &str) -> bool {
        self.sender.public_key == public_key
    }

    pub fn target_mut(&mut self, public_key: &str) -> Option<&mut TransactionTarget> {
        self.targets
            .iter_mut()
            .find(|t| t.user.public_key == public_key)
    }

    /// Drops everything but the accepting targets and marks the transaction
    /// started. Relative order of the survivors is preserved.
    pub fn freeze_accepted(&mut self) {
        self.targets.retain(|t| t.status == TargetStatus::Accepted);
        self.started = true;
    }
}
