// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user store for tests and `STORE_BACKEND=memory` runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LocalUser, StoreError, UserStore};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, LocalUser>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    pub async fn get(&self, external_subject: &str) -> Option<LocalUser> {
        self.users.read().await.get(external_subject).cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn upsert(&self, external_subject: &str, email: &str) -> Result<LocalUser, StoreError> {
        let now = Utc::now();
        // Single write lock covers the lookup and the insert.
        let mut users = self.users.write().await;
        let user = users
            .entry(external_subject.to_string())
            .and_modify(|user| {
                user.email = email.to_string();
                user.updated_at = now;
            })
            .or_insert_with(|| LocalUser {
                id: Uuid::new_v4().to_string(),
                external_subject: external_subject.to_string(),
                email: email.to_string(),
                created_at: now,
                updated_at: now,
            });
        Ok(user.clone())
    }
}
