// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The bidirectional channel speaks JSON objects `{"type": <int>, "data": <any>}`.
//!
//! `WsKind` is the closed set of message tags. Unknown tags are ignored by
//! the dispatcher, so the enum round-trips through `from_u8` rather than a
//! serde representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    transaction::{FileInfo, Transaction},
    user::MinimalUser,
};

/// Message tags carried in the envelope `type` field.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsKind {
    /// Reserved.
    None = 0,
    /// Server → client, string reason.
    Error = 1,
    /// Toggle discoverability; acked with "success".
    ConfigDiscoverable = 2,
    /// Request the discoverable-peer listing.
    StartSharing = 3,
    /// Listing reply, sequence of peer projections.
    UserShareList = 4,
    /// Create a transaction; reply carries the fresh snapshot.
    NewTransaction = 5,
    /// Query a transaction by id.
    InfoTransaction = 6,
    /// Delete a transaction; also the teardown notice to its targets.
    DeleteTransaction = 7,
    /// Replace a transaction's target set.
    UserShareTarget = 8,
    /// Attach file metadata to a transaction.
    FileShareTarget = 9,
    /// Freeze accepted targets and broadcast the start payload.
    StartTransaction = 10,
    /// A target accepts or declines a share offer.
    TransactionShareAccept = 11,
    /// Opaque peer-connection signaling relay.
    WebrtcSignal = 12,
    /// Reply with the caller's full user record.
    UserInfo = 13,
    /// Rename the calling identity; acked with "success".
    ConfigName = 14,
    /// Sender-only query for the current target list.
    TransactionHostRecv = 15,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown message kind: {0}")]
pub struct UnknownKind(pub u8);

impl WsKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::None,
            1 => Self::Error,
            2 => Self::ConfigDiscoverable,
            3 => Self::StartSharing,
            4 => Self::UserShareList,
            5 => Self::NewTransaction,
            6 => Self::InfoTransaction,
            7 => Self::DeleteTransaction,
            8 => Self::UserShareTarget,
            9 => Self::FileShareTarget,
            10 => Self::StartTransaction,
            11 => Self::TransactionShareAccept,
            12 => Self::WebrtcSignal,
            13 => Self::UserInfo,
            14 => Self::ConfigName,
            15 => Self::TransactionHostRecv,
            _ => return None,
        })
    }
}

impl TryFrom<u8> for WsKind {
    type Error = UnknownKind;

    fn try_from(v: u8) -> Result<Self, UnknownKind> {
        Self::from_u8(v).ok_or(UnknownKind(v))
    }
}

impl From<WsKind> for u8 {
    fn from(kind: WsKind) -> Self {
        kind as u8
    }
}

/// One frame on the wire. `data` is absent on request kinds that carry no
/// payload, so it defaults to `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(kind: WsKind, data: impl Serialize) -> Self {
        Self {
            kind: kind.into(),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(WsKind::Error, reason.into())
    }
}

// ── Request payloads (client → server) ──────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShareTargetsRequest {
    pub transaction_id: String,
    pub public_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShareFilesRequest {
    pub transaction_id: String,
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartRequest {
    pub transaction_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShareResponse {
    pub transaction_id: String,
    pub accept: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalRequest {
    pub transaction_id: String,
    pub target_key: String,
    pub data: Value,
}

// ── Reply payloads (server → client) ────────────────────────────────────────

/// Share offer delivered to each newly selected target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareInvite {
    pub transaction: Transaction,
    pub sender: String,
}

/// Start payload delivered to every accepted target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartNotice {
    pub transaction_id: String,
    pub sender: String,
    pub files: Vec<FileInfo>,
}

/// Relayed signaling blob, rewritten so the receiver learns the origin key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalForward {
    pub transaction_id: String,
    pub from_key: String,
    pub data: Value,
}

/// Sent to the transaction sender when a target accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub username: String,
    pub accepted: bool,
    pub transaction_id: String,
    pub sender_public_key: String,
}

impl AcceptNotification {
    pub fn new(responder: &MinimalUser, transaction_id: String) -> Self {
        Self {
            kind: "accept_notification".to_string(),
            username: responder.username.clone(),
            accepted: true,
            transaction_id,
            sender_public_key: responder.public_key.clone(),
        }
    }
}

/// Sent to the transaction sender when a target declines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub username: String,
    pub declined: bool,
    pub transaction_id: String,
    pub reason: String,
}

impl DeclineNotification {
    pub fn new(responder: &MinimalUser, transaction_id: String, reason: String) -> Self {
        Self {
            kind: "decline_notification".to_string(),
            username: responder.username.clone(),
            declined: true,
            transaction_id,
            reason,
        }
    }
}
