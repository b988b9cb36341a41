// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Default session-token lifetime.
pub const TOKEN_TTL: TimeDelta = TimeDelta::hours(72);

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub public_key: String,
    /// Unix seconds.
    pub exp: u64,
}

impl Claims {
    pub fn expiry(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp as i64, 0).unwrap_or_default()
    }
}

/// Mints an HS256 token with the default lifetime.
pub fn mint(secret: &str, username: &str, public_key: &str) -> Result<String, ServerError> {
    mint_with_expiry(secret, username, public_key, Utc::now() + TOKEN_TTL)
}

/// Mints an HS256 token expiring at `expiry`.
pub fn mint_with_expiry(
    secret: &str,
    username: &str,
    public_key: &str,
    expiry: DateTime<Utc>,
) -> Result<String, ServerError> {
    let claims = Claims {
        username: username.to_string(),
        public_key: public_key.to_string(),
        exp: expiry.timestamp().max(0) as u64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| ServerError::Unauthorized)
}

/// Verifies the signature and expiry and returns the claims.
pub fn verify(secret: &str, token: &str) -> Result<Claims, ServerError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ServerError::Expired("token"),
        _ => ServerError::Unauthorized,
    })
}
