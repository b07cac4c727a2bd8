// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and registration: provider call, token verification, local upsert.
//!
//! Each flow is strictly sequential and fails at the first broken step.
//! Provider and store detail is logged here and replaced with a fixed
//! message for the caller; the only provider text that reaches a caller is
//! the registration conflict message.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::TokenVerifier;
use crate::error::RpcError;
use crate::idp::{IdentityProvider, ProviderError};
use crate::users::{LocalUser, UserStore};

/// Credential plus the reconciled local record.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub user: LocalUser,
}

#[derive(Clone)]
pub struct AuthService {
    idp: Arc<dyn IdentityProvider>,
    verifier: Arc<dyn TokenVerifier>,
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(
        idp: Arc<dyn IdentityProvider>,
        verifier: Arc<dyn TokenVerifier>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            idp,
            verifier,
            users,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, RpcError> {
        let access_token = self.idp.login(email, password).await.map_err(|e| {
            match &e {
                ProviderError::Rejected(_) => warn!(email, error = %e, "provider login refused"),
                _ => error!(email, error = %e, "provider login failed"),
            }
            RpcError::unauthenticated("invalid credentials")
        })?;

        self.reconcile(email, access_token).await
    }

    /// Create the account at the provider, then log in with the same
    /// credentials. A failed login here leaves the provider account in
    /// place without a local record; the caller retries `login`.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, RpcError> {
        self.idp
            .register(username, email, password)
            .await
            .map_err(|e| match e {
                ProviderError::Rejected(message) => {
                    info!(username, email, reason = %message, "registration rejected");
                    RpcError::already_exists(message)
                }
                other => {
                    error!(username, email, error = %other, "provider registration failed");
                    RpcError::internal("registration failed")
                }
            })?;

        let access_token = self.idp.login(email, password).await.map_err(|e| {
            error!(username, email, error = %e, "login after register failed");
            RpcError::internal("login after register failed")
        })?;

        self.reconcile(email, access_token).await
    }

    /// Verify a token the provider just issued and upsert its local user.
    async fn reconcile(&self, email: &str, access_token: String) -> Result<LoginOutcome, RpcError> {
        let identity = self.verifier.verify(&access_token).await.map_err(|e| {
            // A token the provider just issued should always verify.
            error!(email, error = %e, "freshly issued token failed verification");
            RpcError::internal("token verification failed")
        })?;

        let user = self
            .users
            .upsert(&identity.subject, &identity.email)
            .await
            .map_err(|e| {
                error!(subject = %identity.subject, error = %e, "user upsert failed");
                RpcError::internal("db error")
            })?;

        info!(user_id = %user.id, subject = %user.external_subject, "user logged in");
        Ok(LoginOutcome { access_token, user })
    }
}
