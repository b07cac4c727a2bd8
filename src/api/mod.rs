// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface.
//!
//! RPC methods are `POST /<package>.<Service>/<Method>` with JSON bodies and
//! sit behind the auth gateway. Health probes and API docs are mounted
//! outside it.

use axum::{
    extract::FromRequest,
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{gateway_middleware, PublicMethodSet},
    error::{Code, ErrorBody, RpcError},
    models::{
        LoginRequest, LoginResponse, PingRequest, PingResponse, RegisterRequest, RegisterResponse,
    },
    state::AppState,
};

pub mod health;
pub mod secure;

pub const PING_METHOD: &str = "/auth.v1.SecureService/Ping";
pub const LOGIN_METHOD: &str = "/auth.v1.SecureService/Login";
pub const REGISTER_METHOD: &str = "/auth.v1.SecureService/Register";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// JSON body extractor whose rejection is an [`RpcError`], so a malformed
/// body answers with the same error shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(RpcError))]
pub struct RpcJson<T>(pub T);

/// Methods callable without a bearer token.
pub fn public_methods() -> PublicMethodSet {
    PublicMethodSet::new([LOGIN_METHOD, REGISTER_METHOD])
}

pub fn router(state: AppState) -> Router {
    let rpc_routes = Router::new()
        .route(PING_METHOD, post(secure::ping))
        .route(LOGIN_METHOD, post(secure::login))
        .route(REGISTER_METHOD, post(secure::register))
        .route_layer(from_fn_with_state(
            state.gateway.clone(),
            gateway_middleware,
        ));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(rpc_routes)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        secure::ping,
        secure::login,
        secure::register,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            PingRequest,
            PingResponse,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            RegisterResponse,
            ErrorBody,
            Code,
            health::CheckStatus,
            health::LiveResponse,
            health::ReadyResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "SecureService", description = "Authenticated RPC surface"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, AuthGateway, ExternalIdentity, JwksCache, TokenVerifier};
    use crate::idp::{IdentityProvider, ProviderError};
    use crate::service::AuthService;
    use crate::users::InMemoryUserStore;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Knows alice@x.com/pw; "taken@x.com" is already registered.
    struct FakeProvider;

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn login(&self, identifier: &str, secret: &str) -> Result<String, ProviderError> {
            match (identifier, secret) {
                ("alice@x.com", "pw") => Ok("tok123".to_string()),
                _ => Err(ProviderError::Rejected("invalid username or password".into())),
            }
        }

        async fn register(&self, _: &str, identifier: &str, _: &str) -> Result<(), ProviderError> {
            if identifier == "taken@x.com" {
                Err(ProviderError::Rejected("user already exists".into()))
            } else {
                Ok(())
            }
        }
    }

    struct FakeVerifier;

    #[async_trait]
    impl TokenVerifier for FakeVerifier {
        async fn verify(&self, token: &str) -> Result<ExternalIdentity, AuthError> {
            match token {
                "tok123" => Ok(ExternalIdentity {
                    subject: "alice-sub".into(),
                    email: "alice@x.com".into(),
                }),
                "expired" => Err(AuthError::Expired),
                _ => Err(AuthError::Malformed),
            }
        }
    }

    fn app_with(public: PublicMethodSet) -> Router {
        let verifier: Arc<dyn TokenVerifier> = Arc::new(FakeVerifier);
        let service = AuthService::new(
            Arc::new(FakeProvider),
            verifier.clone(),
            Arc::new(InMemoryUserStore::new()),
        );
        let gateway = Arc::new(AuthGateway::new(public, verifier));
        router(AppState::new(service, gateway))
    }

    fn app() -> Router {
        app_with(public_methods())
    }

    fn call(method: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(method)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn default_public_set_is_login_and_register() {
        let public = public_methods();
        assert_eq!(public.len(), 2);
        assert!(public.contains(LOGIN_METHOD));
        assert!(public.contains(REGISTER_METHOD));
        assert!(!public.contains(PING_METHOD));
    }

    #[tokio::test]
    async fn ping_without_token_is_unauthenticated() {
        let response = app()
            .oneshot(call(PING_METHOD, None, json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["grpc-status"], "16");
        let body = json_body(response).await;
        assert_eq!(body["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn ping_with_expired_token_is_unauthenticated() {
        let response = app()
            .oneshot(call(PING_METHOD, Some("expired"), json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "invalid token");
    }

    #[tokio::test]
    async fn ping_with_valid_token_echoes() {
        let response = app()
            .oneshot(call(PING_METHOD, Some("tok123"), json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"message": "Pong: hi"}));
    }

    #[tokio::test]
    async fn ping_is_public_only_when_listed() {
        let public = PublicMethodSet::new([LOGIN_METHOD, REGISTER_METHOD, PING_METHOD]);
        let response = app_with(public)
            .oneshot(call(PING_METHOD, None, json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "Pong: hi");
    }

    #[tokio::test]
    async fn login_is_public_and_returns_token() {
        let response = app()
            .oneshot(call(
                LOGIN_METHOD,
                None,
                json!({"email": "alice@x.com", "password": "pw"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["accessToken"], "tok123");
        assert_eq!(body["email"], "alice@x.com");
        assert!(!body["userId"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn login_with_malformed_body_is_invalid_argument() {
        let response = app()
            .oneshot(call(LOGIN_METHOD, None, json!({"email": "alice@x.com"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["grpc-status"], "3");
        assert_eq!(
            json_body(response).await,
            json!({"code": "invalid_argument", "message": "malformed request body"})
        );
    }

    #[tokio::test]
    async fn login_with_bad_password_is_unauthenticated() {
        let response = app()
            .oneshot(call(
                LOGIN_METHOD,
                None,
                json!({"email": "alice@x.com", "password": "nope"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn register_then_login_report_same_user_id() {
        let app = app();

        let registered = app
            .clone()
            .oneshot(call(
                REGISTER_METHOD,
                None,
                json!({"username": "alice", "email": "alice@x.com", "password": "pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(registered.status(), StatusCode::OK);
        let registered = json_body(registered).await;
        assert!(registered.get("accessToken").is_none());

        let logged_in = app
            .oneshot(call(
                LOGIN_METHOD,
                None,
                json!({"email": "alice@x.com", "password": "pw"}),
            ))
            .await
            .unwrap();
        let logged_in = json_body(logged_in).await;

        assert_eq!(registered["userId"], logged_in["userId"]);
    }

    #[tokio::test]
    async fn duplicate_register_is_conflict_with_provider_message() {
        let response = app()
            .oneshot(call(
                REGISTER_METHOD,
                None,
                json!({"username": "bob", "email": "taken@x.com", "password": "pw"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.headers()["grpc-status"], "6");
        let body = json_body(response).await;
        assert_eq!(body, json!({"code": "already_exists", "message": "user already exists"}));
    }

    #[tokio::test]
    async fn health_is_outside_the_gateway() {
        let response = app()
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app()
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body.get("signingKeys").is_none());
    }

    #[tokio::test]
    async fn readiness_fails_when_signing_keys_unreachable() {
        let verifier: Arc<dyn TokenVerifier> = Arc::new(FakeVerifier);
        let service = AuthService::new(
            Arc::new(FakeProvider),
            verifier.clone(),
            Arc::new(InMemoryUserStore::new()),
        );
        let gateway = Arc::new(AuthGateway::new(public_methods(), verifier));
        let jwks = JwksCache::new("http://127.0.0.1:9/jwks", reqwest::Client::new());
        let app = router(AppState::new(service, gateway).with_jwks(Arc::new(jwks)));

        let response = app
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body, json!({"status": "unavailable", "signingKeys": "unavailable"}));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = app()
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[test]
    fn openapi_lists_rpc_methods() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(PING_METHOD));
        assert!(doc.paths.paths.contains_key(LOGIN_METHOD));
        assert!(doc.paths.paths.contains_key(REGISTER_METHOD));
    }
}
