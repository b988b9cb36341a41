// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::path::Path;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::{error::ServerError, models::user::User};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    public_key TEXT NOT NULL UNIQUE,
    is_discoverable INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
)";

/// Identity store adapter over an embedded SQLite database.
///
/// Uniqueness of `username` and `public_key` is enforced by the schema;
/// violations surface as [`ServerError::Conflict`].
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Opens (creating if missing) the database at `path`. `":memory:"`
    /// yields a private in-memory store.
    pub async fn connect(path: &str) -> Result<Self, ServerError> {
        let (options, max_connections) = if path == ":memory:" {
            // One shared connection, otherwise every pool checkout would see
            // its own empty database.
            (SqliteConnectOptions::new().in_memory(true), 1)
        } else {
            if let Some(dir) = Path::new(path).parent()
                && !dir.as_os_str().is_empty()
            {
                std::fs::create_dir_all(dir).map_err(|e| {
                    ServerError::Store(sqlx::Error::Io(e))
                })?;
            }
            (
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true),
                5,
            )
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Creates the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), ServerError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn create_user(
        &self,
        username: &str,
        public_key: &str,
    ) -> Result<User, ServerError> {
        let res = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, public_key, is_discoverable, created_at) \
             VALUES (?, ?, 1, ?) \
             RETURNING id, username, public_key, is_discoverable, created_at",
        )
        .bind(username)
        .bind(public_key)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        res.map_err(conflict_or_store)
    }

    pub async fn find_by_public_key(&self, public_key: &str) -> Result<User, ServerError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, public_key, is_discoverable, created_at \
             FROM users WHERE public_key = ?",
        )
        .bind(public_key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServerError::NotFound("user"))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User, ServerError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, public_key, is_discoverable, created_at \
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServerError::NotFound("user"))
    }

    /// Renames the identity owning `public_key`.
    pub async fn update_username(
        &self,
        public_key: &str,
        new_name: &str,
    ) -> Result<User, ServerError> {
        let res = sqlx::query_as::<_, User>(
            "UPDATE users SET username = ? WHERE public_key = ? \
             RETURNING id, username, public_key, is_discoverable, created_at",
        )
        .bind(new_name)
        .bind(public_key)
        .fetch_optional(&self.pool)
        .await;

        match res {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ServerError::NotFound("user")),
            Err(e) => Err(conflict_or_store(e)),
        }
    }

    pub async fn set_discoverable(
        &self,
        public_key: &str,
        discoverable: bool,
    ) -> Result<(), ServerError> {
        let res = sqlx::query("UPDATE users SET is_discoverable = ? WHERE public_key = ?")
            .bind(discoverable)
            .bind(public_key)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(ServerError::NotFound("user"));
        }
        Ok(())
    }
}

fn conflict_or_store(e: sqlx::Error) -> ServerError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ServerError::Conflict,
        _ => ServerError::Store(e),
    }
}
