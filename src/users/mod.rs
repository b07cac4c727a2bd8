// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local user records reconciled against the identity provider.
//!
//! Every successful login or registration upserts one row keyed on the
//! provider's subject (`casdoor_id`). The email is refreshed on each call;
//! the local `id` never changes once assigned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    pub id: String,
    pub external_subject: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store query error: {0}")]
    Query(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert-or-update keyed on `external_subject`, atomic per subject.
    async fn upsert(&self, external_subject: &str, email: &str) -> Result<LocalUser, StoreError>;
}
