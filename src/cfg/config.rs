// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::env;

use anyhow::{Result, ensure};

/// Built-in HMAC secret. Deployments MUST override `SERVER_SECRET`.
pub const DEFAULT_SECRET: &str = "secret";
const DEFAULT_URL: &str = "0.0.0.0:8080";
const DEFAULT_DB_PATH: &str = "./db/data.db";

/// Runtime parameters, all sourced from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address, `SERVER_URL`.
    pub server_url: String,
    /// HMAC key for session tokens, `SERVER_SECRET`.
    pub server_secret: String,
    /// Path to the embedded relational store, `DB_PATH`.
    pub db_path: String,
}

impl Config {
    /// Reads the configuration from the environment, filling in defaults
    /// for anything unset or empty.
    pub fn from_env() -> Self {
        Self {
            server_url: env_or("SERVER_URL", DEFAULT_URL),
            server_secret: env_or("SERVER_SECRET", DEFAULT_SECRET),
            db_path: env_or("DB_PATH", DEFAULT_DB_PATH),
        }
    }

    /// Validates invariants the rest of the process relies on.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.server_url.is_empty(), "listen address must not be empty");
        ensure!(!self.server_secret.is_empty(), "server secret must not be empty");
        ensure!(!self.db_path.is_empty(), "store path must not be empty");
        Ok(())
    }

    /// True when the HMAC key was left at the built-in default.
    pub fn is_default_secret(&self) -> bool {
        self.server_secret == DEFAULT_SECRET
    }
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}
