//! Live, authenticated per-connection state.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Snapshot of currently-connected, opt-in users.
pub mod cache;
/// One authenticated connection and its outbound queue.
pub mod connection;
/// Registry of live sessions, one per public key.
pub mod registry;
