// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the caller's verified identity.
//!
//! ```rust,ignore
//! async fn my_handler(Caller(caller): Caller) -> impl IntoResponse {
//!     // caller is Some(ExternalIdentity) behind the bearer gate,
//!     // None on public methods
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::ExternalIdentity;

/// Identity attached by the gateway middleware, if any.
///
/// Never rejects: the gateway has already made the authorization decision.
pub struct Caller(pub Option<ExternalIdentity>);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<ExternalIdentity>().cloned()))
    }
}
