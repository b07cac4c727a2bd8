// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification against the provider's published keys.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;
use tracing::info;

use super::claims::{ExternalIdentity, ProviderClaims};
use super::error::AuthError;
use super::jwks::JwksCache;

/// Verifies a bearer credential and yields the identity it proves.
///
/// Implementations must not cache negative results.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<ExternalIdentity, AuthError>;
}

/// The subset of the OIDC discovery document we rely on.
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    issuer: String,
    jwks_uri: String,
}

/// OIDC access-token verifier backed by a cached JWKS.
///
/// Checks signature, `iss`, `aud` (the registered client id), `exp` and
/// `nbf`, with no clock leeway.
#[derive(Clone)]
pub struct OidcVerifier {
    jwks: Arc<JwksCache>,
    issuer: String,
    audience: String,
}

impl OidcVerifier {
    pub fn new(
        jwks: Arc<JwksCache>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            jwks,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Build a verifier from `{provider_url}/.well-known/openid-configuration`.
    ///
    /// The advertised issuer must match `provider_url`; a mismatch usually
    /// means the gateway points at the wrong Casdoor origin.
    pub async fn discover(
        provider_url: &str,
        audience: &str,
        client: reqwest::Client,
        cache_ttl: Duration,
    ) -> Result<Self, AuthError> {
        let base = provider_url.trim_end_matches('/');
        let discovery_url = format!("{base}/.well-known/openid-configuration");

        let response = client
            .get(&discovery_url)
            .send()
            .await
            .map_err(|e| AuthError::Discovery(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthError::Discovery(format!(
                "HTTP {} from {discovery_url}",
                response.status()
            )));
        }
        let document: DiscoveryDocument = response
            .json()
            .await
            .map_err(|e| AuthError::Discovery(e.to_string()))?;

        if document.issuer.trim_end_matches('/') != base {
            return Err(AuthError::Discovery(format!(
                "issuer mismatch: expected {base}, provider advertises {}",
                document.issuer
            )));
        }

        info!(issuer = %document.issuer, jwks_uri = %document.jwks_uri, "OIDC provider discovered");

        let jwks = JwksCache::new(document.jwks_uri, client).ttl(cache_ttl);
        Ok(Self::new(Arc::new(jwks), document.issuer, audience))
    }

    pub fn jwks(&self) -> Arc<JwksCache> {
        Arc::clone(&self.jwks)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

#[async_trait]
impl TokenVerifier for OidcVerifier {
    async fn verify(&self, token: &str) -> Result<ExternalIdentity, AuthError> {
        // Decode header to get kid (key ID)
        let header = decode_header(token).map_err(|_| AuthError::Malformed)?;

        let resolved = self.jwks.key_for(header.kid.as_deref()).await?;

        let mut validation = Validation::new(resolved.algorithm);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data =
            decode::<ProviderClaims>(token, &resolved.key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    ErrorKind::InvalidSignature => AuthError::BadSignature,
                    ErrorKind::InvalidIssuer => AuthError::WrongIssuer,
                    ErrorKind::InvalidAudience => AuthError::WrongAudience,
                    ErrorKind::ImmatureSignature => AuthError::NotYetValid,
                    ErrorKind::MissingRequiredClaim(claim) => {
                        AuthError::Claims(format!("missing `{claim}` claim"))
                    }
                    ErrorKind::Json(err) => AuthError::Claims(err.to_string()),
                    _ => AuthError::Malformed,
                }
            })?;

        let claims = token_data.claims;

        // jsonwebtoken accepts exp == now; a token is dead from its expiry second on.
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        claims.into_identity()
    }
}
