// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authorization chokepoint.
//!
//! Every inbound call is run through an ordered chain of [`Gate`]s before it
//! reaches a handler. A gate either forwards the call, passes it on to the
//! next gate, or rejects it. The default chain is:
//!
//! 1. [`PublicMethodGate`] - forwards methods listed in the [`PublicMethodSet`]
//!    without looking at metadata
//! 2. [`BearerTokenGate`] - requires `authorization: Bearer <token>` and a
//!    token the [`TokenVerifier`] accepts
//!
//! A call that falls off the end of the chain is rejected.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::{debug, warn};

use super::claims::ExternalIdentity;
use super::error::AuthError;
use super::verifier::TokenVerifier;

/// Fully-qualified method names exempt from credential verification.
///
/// Built once at startup and never mutated. Matching is exact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicMethodSet {
    methods: BTreeSet<String>,
}

impl PublicMethodSet {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// What a gate gets to see of a call.
#[derive(Debug, Clone, Copy)]
pub struct CallInfo<'a> {
    /// Fully-qualified method, e.g. `/auth.v1.SecureService/Ping`
    pub method: &'a str,
    /// Call metadata; `None` when the transport delivered none at all
    pub metadata: Option<&'a HeaderMap>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the call through, optionally with the identity that was proven.
    Forward(Option<ExternalIdentity>),
    /// No opinion; ask the next gate.
    Continue,
    Reject(AuthError),
}

#[async_trait]
pub trait Gate: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, call: &CallInfo<'_>) -> GateDecision;
}

pub struct PublicMethodGate {
    methods: Arc<PublicMethodSet>,
}

impl PublicMethodGate {
    pub fn new(methods: Arc<PublicMethodSet>) -> Self {
        Self { methods }
    }
}

#[async_trait]
impl Gate for PublicMethodGate {
    fn name(&self) -> &'static str {
        "public_method"
    }

    async fn check(&self, call: &CallInfo<'_>) -> GateDecision {
        if self.methods.contains(call.method) {
            GateDecision::Forward(None)
        } else {
            GateDecision::Continue
        }
    }
}

pub struct BearerTokenGate {
    verifier: Arc<dyn TokenVerifier>,
}

impl BearerTokenGate {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl Gate for BearerTokenGate {
    fn name(&self) -> &'static str {
        "bearer_token"
    }

    async fn check(&self, call: &CallInfo<'_>) -> GateDecision {
        let token = match bearer_token(call.metadata) {
            Ok(token) => token,
            Err(e) => return GateDecision::Reject(e),
        };

        match self.verifier.verify(token).await {
            Ok(identity) => GateDecision::Forward(Some(identity)),
            Err(e) => GateDecision::Reject(e),
        }
    }
}

/// Pull the credential out of call metadata.
///
/// The `Bearer ` prefix is stripped when present. A value without it is
/// still handed to the verifier as-is.
pub fn bearer_token(metadata: Option<&HeaderMap>) -> Result<&str, AuthError> {
    let metadata = metadata.ok_or(AuthError::MissingMetadata)?;
    let value = metadata
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::UnreadableCredential)?;

    Ok(value.strip_prefix("Bearer ").unwrap_or(value))
}

/// Ordered gate chain guarding every call.
pub struct AuthGateway {
    gates: Vec<Box<dyn Gate>>,
}

impl AuthGateway {
    /// The standard chain: public allowlist, then bearer verification.
    pub fn new(public_methods: PublicMethodSet, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self::with_gates(vec![
            Box::new(PublicMethodGate::new(Arc::new(public_methods))),
            Box::new(BearerTokenGate::new(verifier)),
        ])
    }

    pub fn with_gates(gates: Vec<Box<dyn Gate>>) -> Self {
        Self { gates }
    }

    /// Decide whether `call` may reach its handler.
    ///
    /// Returns the verified identity when a gate proved one.
    pub async fn authorize(
        &self,
        call: &CallInfo<'_>,
    ) -> Result<Option<ExternalIdentity>, AuthError> {
        for gate in &self.gates {
            match gate.check(call).await {
                GateDecision::Forward(identity) => {
                    debug!(method = call.method, gate = gate.name(), "Call admitted");
                    return Ok(identity);
                }
                GateDecision::Continue => continue,
                GateDecision::Reject(err) => {
                    warn!(
                        method = call.method,
                        gate = gate.name(),
                        reason = err.reason(),
                        error = %err,
                        "Call rejected"
                    );
                    return Err(err);
                }
            }
        }

        warn!(method = call.method, "No gate admitted the call");
        Err(AuthError::Internal(
            "no gate admitted the call".to_string(),
        ))
    }
}
