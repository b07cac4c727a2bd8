// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Casdoor bearer-token authentication for the SecureService RPC API.
//!
//! ## Auth Flow
//!
//! 1. Client obtains an access token through `Login` (or `Register`)
//! 2. Client sends `authorization: Bearer <token>` on every other call
//! 3. Gateway:
//!    - Lets allowlisted methods through untouched
//!    - Fetches Casdoor's JWKS (located via OIDC discovery)
//!    - Verifies signature, expiry, issuer, audience
//!    - Attaches `sub` + `email` to the request as an [`ExternalIdentity`]
//!
//! ## Security
//!
//! - Every non-allowlisted method requires authentication
//! - JWKS is cached with TTL and refetched on unknown key ids
//! - No clock skew tolerance on expiry

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod jwks;
pub mod middleware;
pub mod verifier;

pub use claims::{ExternalIdentity, ProviderClaims};
pub use error::AuthError;
pub use extractor::Caller;
pub use gateway::{AuthGateway, CallInfo, Gate, GateDecision, PublicMethodSet};
pub use jwks::JwksCache;
pub use middleware::gateway_middleware;
pub use verifier::{OidcVerifier, TokenVerifier};
