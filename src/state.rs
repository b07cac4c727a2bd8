// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthGateway, JwksCache};
use crate::service::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub service: AuthService,
    pub gateway: Arc<AuthGateway>,
    /// Provider signing keys, checked by the readiness probe.
    /// `None` when the verifier does not fetch keys (tests).
    pub jwks: Option<Arc<JwksCache>>,
}

impl AppState {
    pub fn new(service: AuthService, gateway: Arc<AuthGateway>) -> Self {
        Self {
            service,
            gateway,
            jwks: None,
        }
    }

    pub fn with_jwks(mut self, jwks: Arc<JwksCache>) -> Self {
        self.jwks = Some(jwks);
        self
    }
}
