//! Login freshness, signature verification, and session tokens.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Single-use login nonces with a TTL.
pub mod challenge;
/// Ed25519 challenge-signature verification.
pub mod signature;
/// HS256 session tokens.
pub mod token;
