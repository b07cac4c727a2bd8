// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Mounts the [`AuthGateway`] in front of the RPC router. The request path is
//! the fully-qualified method name and the header map is the call metadata.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/auth.v1.SecureService/Ping", post(ping))
//!     .layer(axum::middleware::from_fn_with_state(gateway, gateway_middleware));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::gateway::{AuthGateway, CallInfo};

/// Run the gate chain, then forward the request unchanged.
///
/// A verified identity is added to the request extensions for handlers
/// (see [`super::Caller`]).
pub async fn gateway_middleware(
    State(gateway): State<Arc<AuthGateway>>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = {
        let call = CallInfo {
            method: request.uri().path(),
            metadata: Some(request.headers()),
        };
        gateway.authorize(&call).await
    };

    match decision {
        Ok(identity) => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
