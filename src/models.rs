// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # RPC Messages
//!
//! Request and response bodies for `auth.v1.SecureService`. Field names are
//! camelCase on the wire, matching the protobuf JSON mapping.
//!
//! - **Ping**: echo, authenticated
//! - **Login**: email + password in, access token and local user out
//! - **Register**: create the provider account, then log in

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::LoginOutcome;

// =============================================================================
// Ping
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub message: String,
}

// =============================================================================
// Login
// =============================================================================

#[derive(Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login: the provider's access token and the local user it maps to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token to send on authenticated calls.
    pub access_token: String,
    /// Stable local user identifier.
    pub user_id: String,
    pub email: String,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            access_token: outcome.access_token,
            user_id: outcome.user.id,
            email: outcome.user.email,
        }
    }
}

// =============================================================================
// Register
// =============================================================================

#[derive(Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    pub email: String,
}

impl From<LoginOutcome> for RegisterResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            user_id: outcome.user.id,
            email: outcome.user.email,
        }
    }
}
