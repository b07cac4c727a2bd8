// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider integration.
//!
//! The gateway talks to exactly one provider through the narrow
//! [`IdentityProvider`] interface: password login and account creation.
//! Neither operation is retried here.

use std::time::Duration;

use async_trait::async_trait;

pub mod casdoor;

pub use casdoor::CasdoorClient;

/// Timeout applied to every provider HTTP call.
pub const PROVIDER_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered and said no (bad password, duplicate user, ...).
    #[error("provider rejected the request: {0}")]
    Rejected(String),

    /// The provider could not be reached or the exchange broke off.
    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider response was invalid: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an identifier (email) and password for an access token.
    async fn login(&self, identifier: &str, secret: &str) -> Result<String, ProviderError>;

    /// Create an account. Not idempotent: a second call for the same
    /// identifier is expected to be rejected by the provider.
    async fn register(
        &self,
        username: &str,
        identifier: &str,
        secret: &str,
    ) -> Result<(), ProviderError>;
}

/// HTTP client shared by the provider client and the JWKS cache.
pub fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(PROVIDER_HTTP_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))
}
