//! Data model: persisted users, wire messages, and transactions.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Tagged message envelope and payload shapes.
pub mod message;
/// Multi-target file-offer transactions.
pub mod transaction;
/// Persisted user record and its broadcast projection.
pub mod user;
