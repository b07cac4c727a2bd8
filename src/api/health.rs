// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Liveness and readiness probes. Mounted outside the auth gateway.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Unavailable,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LiveResponse {
    pub status: CheckStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: CheckStatus,
    /// Whether the provider's signing keys can be loaded. Omitted when the
    /// running verifier has no key set to check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_keys: Option<CheckStatus>,
}

async fn signing_keys(state: &AppState) -> Option<CheckStatus> {
    let jwks = state.jwks.as_ref()?;
    let loaded = jwks.is_fresh().await || jwks.reload().await.is_ok();
    Some(if loaded {
        CheckStatus::Ok
    } else {
        CheckStatus::Unavailable
    })
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is up", body = LiveResponse))
)]
pub async fn liveness() -> Json<LiveResponse> {
    Json(LiveResponse {
        status: CheckStatus::Ok,
    })
}

/// 503 while signing keys cannot be loaded: no authenticated call could
/// succeed in that state.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve", body = ReadyResponse),
        (status = 503, description = "Signing keys unavailable", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let keys = signing_keys(&state).await;
    let (code, status) = match keys {
        Some(CheckStatus::Unavailable) => (StatusCode::SERVICE_UNAVAILABLE, CheckStatus::Unavailable),
        _ => (StatusCode::OK, CheckStatus::Ok),
    };

    (
        code,
        Json(ReadyResponse {
            status,
            signing_keys: keys,
        }),
    )
}
