// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PostgreSQL user store.
//!
//! Expects an existing `users` table with a unique `casdoor_id` column;
//! schema management lives outside this service.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::debug;

use super::{LocalUser, StoreError, UserStore};

const UPSERT_USER: &str = r#"
    INSERT INTO users (casdoor_id, email)
    VALUES ($1, $2)
    ON CONFLICT (casdoor_id)
    DO UPDATE SET email = EXCLUDED.email, updated_at = NOW()
    RETURNING id::text AS id, casdoor_id, email,
              created_at::timestamptz AS created_at,
              updated_at::timestamptz AS updated_at
"#;

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("failed to connect postgres: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Round-trip a trivial query; used as a startup check.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn row_to_user(row: &PgRow) -> Result<LocalUser, StoreError> {
    let query_err = |e: sqlx::Error| StoreError::Query(e.to_string());
    Ok(LocalUser {
        id: row.try_get("id").map_err(query_err)?,
        external_subject: row.try_get("casdoor_id").map_err(query_err)?,
        email: row.try_get("email").map_err(query_err)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(query_err)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(query_err)?,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn upsert(&self, external_subject: &str, email: &str) -> Result<LocalUser, StoreError> {
        let row = sqlx::query(UPSERT_USER)
            .bind(external_subject)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    StoreError::Connection(e.to_string())
                }
                other => StoreError::Query(other.to_string()),
            })?;

        let user = row_to_user(&row)?;
        debug!(user_id = %user.id, subject = external_subject, "user upserted");
        Ok(user)
    }
}
