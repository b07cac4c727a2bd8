// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Casdoor Auth Gateway - authenticated RPC front door
//!
//! Every call to `auth.v1.SecureService` passes one authorization chokepoint
//! that checks a Casdoor-issued bearer token, except for an explicit list of
//! public methods. `Login` and `Register` go to Casdoor and reconcile the
//! resulting identity with a local user table.
//!
//! ## Modules
//!
//! - `api` - HTTP routes, RPC handlers and health probes (Axum)
//! - `auth` - Gate chain, OIDC discovery, JWKS cache and token verification
//! - `idp` - Casdoor client (password login, account creation)
//! - `users` - Local user reconciliation (PostgreSQL or in-memory)
//! - `service` - Login / Register orchestration

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod idp;
pub mod logging;
pub mod models;
pub mod server;
pub mod service;
pub mod state;
pub mod users;

#[cfg(test)]
mod test_support;
