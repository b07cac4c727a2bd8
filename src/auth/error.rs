// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Why a call or a credential was refused.
//!
//! The variants are fine-grained for server-side logs. A caller only ever
//! sees `missing metadata`, `missing token` or `invalid token`.

use axum::response::{IntoResponse, Response};

use crate::error::RpcError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("call carried no metadata")]
    MissingMetadata,
    #[error("no authorization header")]
    MissingCredential,
    /// Header bytes are not visible ASCII.
    #[error("authorization header is not valid text")]
    UnreadableCredential,

    #[error("token is not a well-formed JWT")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token was issued by an unexpected issuer")]
    WrongIssuer,
    #[error("token was issued for a different audience")]
    WrongAudience,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("token claims are unusable: {0}")]
    Claims(String),

    #[error("OIDC discovery failed: {0}")]
    Discovery(String),
    #[error("could not load signing keys: {0}")]
    KeyFetch(String),
    /// No key in the provider's set carries the token's `kid`.
    #[error("no signing key matches the token")]
    UnknownKey,
    #[error("authentication internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Short machine-readable reason, for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingMetadata => "missing_metadata",
            Self::MissingCredential => "missing_credential",
            Self::UnreadableCredential => "unreadable_credential",
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::WrongIssuer => "wrong_issuer",
            Self::WrongAudience => "wrong_audience",
            Self::NotYetValid => "not_yet_valid",
            Self::Claims(_) => "claims",
            Self::Discovery(_) => "discovery",
            Self::KeyFetch(_) => "key_fetch",
            Self::UnknownKey => "unknown_key",
            Self::Internal(_) => "internal",
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingMetadata => "missing metadata",
            Self::MissingCredential => "missing token",
            _ => "invalid token",
        }
    }
}

impl From<AuthError> for RpcError {
    fn from(err: AuthError) -> Self {
        RpcError::unauthenticated(err.public_message())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        RpcError::from(self).into_response()
    }
}
