// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Error kinds shared across the coordination core.
//!
//! Callers branch on kinds, never on message strings. The HTTP layer
//! collapses them to the common response envelope; the message channel
//! surfaces them as `ERROR` frames with the `Display` text.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Input failed to decode or violated a length requirement.
    #[error("malformed input")]
    MalformedInput,

    /// The requester is not allowed to perform this operation.
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate username or public key.
    #[error("username or public key already taken")]
    Conflict,

    /// Challenge or session token past its expiry.
    #[error("{0} expired")]
    Expired(&'static str),

    #[error("transaction has already started")]
    AlreadyStarted,

    /// A target answered a share offer more than once.
    #[error("response already recorded")]
    DuplicateResponse,

    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl ServerError {
    /// True for the kinds the login path must collapse into a single
    /// indistinguishable reply.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput
                | Self::Unauthorized
                | Self::NotFound(_)
                | Self::Expired(_)
        )
    }
}
