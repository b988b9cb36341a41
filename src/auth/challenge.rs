// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use rand::RngExt;

/// How long an issued nonce stays consumable.
pub const CHALLENGE_TTL: TimeDelta = TimeDelta::minutes(2);
/// Janitor cadence for dropping expired nonces.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Registry of outstanding login nonces.
///
/// A nonce is consumable exactly once; whoever presents it must still prove
/// key ownership via the signature, so entries are keyed on the nonce alone.
#[derive(Debug, Default)]
pub struct ChallengeRegistry {
    entries: DashMap<String, DateTime<Utc>>,
}

impl ChallengeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh 32-byte random nonce and records its expiry.
    pub fn issue(&self) -> String {
        self.issue_expiring_at(Utc::now() + CHALLENGE_TTL)
    }

    /// Same as [`issue`](Self::issue) with an explicit expiry.
    pub fn issue_expiring_at(&self, expiry: DateTime<Utc>) -> String {
        let mut raw = [0u8; 32];
        rand::rng().fill(&mut raw);

        let nonce = STANDARD.encode(raw);
        self.entries.insert(nonce.clone(), expiry);
        nonce
    }

    /// Atomically removes the entry and returns its expiry. `None` means
    /// the nonce was never issued, already consumed, or swept.
    pub fn consume(&self, nonce: &str) -> Option<DateTime<Utc>> {
        self.entries.remove(nonce).map(|(_, expiry)| expiry)
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        let now = Utc::now();
        self.entries.retain(|_, expiry| *expiry > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
