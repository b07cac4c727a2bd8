// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the verified external identity.

use serde::Deserialize;

use super::error::AuthError;

/// Claims carried by a Casdoor access token.
///
/// `sub` and `email` are required: a token without them fails to decode
/// instead of producing an identity with empty fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderClaims {
    /// Subject - Casdoor's durable account identifier
    pub sub: String,

    /// Email address at the time the token was issued
    pub email: String,

    /// Issuer (the Casdoor base URL)
    pub iss: String,

    /// Audience (validated by the jsonwebtoken crate, not read directly)
    #[serde(default)]
    pub aud: Option<serde_json::Value>,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: Option<i64>,

    /// Not before timestamp
    #[serde(default)]
    pub nbf: Option<i64>,

    /// Casdoor account name
    #[serde(default)]
    pub name: Option<String>,
}

/// A verified external identity.
///
/// Scoped to a single call. The gateway stores it in the request extensions
/// so handlers can reuse it without re-verifying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Stable subject identifier, the reconciliation key for local users
    pub subject: String,
    /// Email from the most recent verified token
    pub email: String,
}

impl ProviderClaims {
    /// Convert into an identity, refusing blank required fields.
    pub fn into_identity(self) -> Result<ExternalIdentity, AuthError> {
        if self.sub.trim().is_empty() {
            return Err(AuthError::Claims("empty `sub` claim".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(AuthError::Claims("empty `email` claim".to_string()));
        }

        Ok(ExternalIdentity {
            subject: self.sub,
            email: self.email,
        })
    }
}
