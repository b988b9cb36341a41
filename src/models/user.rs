// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persisted identity record.
///
/// `username` and `is_discoverable` are mutable by the holder; `public_key`
/// is the base64 of a 32-byte Ed25519 public key and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub public_key: String,
    pub is_discoverable: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The only identity data ever broadcast to other peers.
    pub fn minimal(&self) -> MinimalUser {
        MinimalUser {
            username: self.username.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// `{username, public_key}` projection used in peer listings and
/// transaction snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalUser {
    pub username: String,
    pub public_key: String,
}
