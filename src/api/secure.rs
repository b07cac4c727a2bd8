// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `auth.v1.SecureService` handlers.
//!
//! Authorization has already happened in the gateway middleware by the time
//! these run; they only do the method's own work.

use axum::{extract::State, Json};
use tracing::debug;

use super::RpcJson;
use crate::auth::Caller;
use crate::error::{ErrorBody, RpcError};
use crate::models::{
    LoginRequest, LoginResponse, PingRequest, PingResponse, RegisterRequest, RegisterResponse,
};
use crate::state::AppState;

const PONG_PREFIX: &str = "Pong: ";

/// Echo a message back. Requires a bearer token.
#[utoipa::path(
    post,
    path = "/auth.v1.SecureService/Ping",
    tag = "SecureService",
    request_body = PingRequest,
    responses(
        (status = 200, description = "Echoed message", body = PingResponse),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn ping(
    Caller(caller): Caller,
    RpcJson(request): RpcJson<PingRequest>,
) -> Json<PingResponse> {
    if let Some(caller) = caller {
        debug!(subject = %caller.subject, "ping");
    }
    Json(PingResponse {
        message: format!("{PONG_PREFIX}{}", request.message),
    })
}

#[utoipa::path(
    post,
    path = "/auth.v1.SecureService/Login",
    tag = "SecureService",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Verification or store failure", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<LoginRequest>,
) -> Result<Json<LoginResponse>, RpcError> {
    let outcome = state.service.login(&request.email, &request.password).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/auth.v1.SecureService/Register",
    tag = "SecureService",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created and logged in", body = RegisterResponse),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 409, description = "Account already exists", body = ErrorBody),
        (status = 500, description = "Provider, verification or store failure", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, RpcError> {
    let outcome = state
        .service
        .register(&request.username, &request.email, &request.password)
        .await?;
    Ok(Json(outcome.into()))
}
