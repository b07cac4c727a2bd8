// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller-facing RPC errors.
//!
//! Every failure that leaves a handler is an [`RpcError`]: a status [`Code`]
//! plus a short message. Provider and store detail never ends up in the
//! message, with the single exception of the registration conflict text.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;
use serde::Serialize;
use utoipa::ToSchema;

/// Status codes surfaced to RPC callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    /// Missing or invalid bearer credential, or bad login credentials.
    Unauthenticated,
    /// The identity provider already has this account.
    AlreadyExists,
    /// Request body is not a valid message for the method.
    InvalidArgument,
    /// Server-side fault (verification mismatch, store failure, ...).
    Internal,
}

impl Code {
    pub fn http_status(self) -> StatusCode {
        match self {
            Code::Unauthenticated => StatusCode::UNAUTHORIZED,
            Code::AlreadyExists => StatusCode::CONFLICT,
            Code::InvalidArgument => StatusCode::BAD_REQUEST,
            Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Numeric gRPC status code, sent in the `grpc-status` header.
    pub fn grpc_code(self) -> u16 {
        match self {
            Code::Unauthenticated => 16,
            Code::AlreadyExists => 6,
            Code::InvalidArgument => 3,
            Code::Internal => 13,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Code::Unauthenticated => "unauthenticated",
            Code::AlreadyExists => "already_exists",
            Code::InvalidArgument => "invalid_argument",
            Code::Internal => "internal",
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: Code,
    pub message: String,
}

/// JSON body returned alongside a failed call.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: Code,
    pub message: String,
}

impl RpcError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(Code::Unauthenticated, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(Code::AlreadyExists, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }
}

impl From<JsonRejection> for RpcError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "unreadable request body");
        RpcError::invalid_argument("malformed request body")
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.code.http_status();
        let grpc_status = HeaderValue::from(self.code.grpc_code());
        let body = Json(ErrorBody {
            code: self.code,
            message: self.message,
        });
        let mut response = (status, body).into_response();
        response.headers_mut().insert("grpc-status", grpc_status);
        response
    }
}
