// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared helpers for unit tests: fixture keys, token signing and
//! in-process HTTP servers standing in for Casdoor.

use axum::{routing::get, Json, Router};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use crate::auth::jwks::DEFAULT_CACHE_TTL;
use crate::auth::verifier::OidcVerifier;

pub const FIXTURE_KID: &str = "test-key-1";
pub const TEST_CLIENT_ID: &str = "client-123";

const SIGNING_KEY_PEM: &str = include_str!("../tests/fixtures/signing_key.pem");
const ROGUE_KEY_PEM: &str = include_str!("../tests/fixtures/rogue_key.pem");
const JWKS_JSON: &str = include_str!("../tests/fixtures/jwks.json");

pub fn jwks_fixture() -> JwkSet {
    serde_json::from_str(JWKS_JSON).expect("fixture JWKS parses")
}

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn spawn(app: Router) -> String {
    spawn_with(|_| app).await
}

/// Like [`spawn`], but the router gets to know its own base URL.
pub async fn spawn_with<F>(build: F) -> String
where
    F: FnOnce(String) -> Router,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let base = format!("http://{addr}");
    let app = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    base
}

/// A provider exposing only OIDC discovery and the fixture JWKS.
pub async fn fake_oidc_provider() -> String {
    spawn_with(|base| {
        let discovery = json!({
            "issuer": &base,
            "jwks_uri": format!("{base}/.well-known/jwks"),
        });
        Router::new()
            .route(
                "/.well-known/openid-configuration",
                get(move || {
                    let discovery = discovery.clone();
                    async move { Json(discovery) }
                }),
            )
            .route("/.well-known/jwks", get(|| async { Json(jwks_fixture()) }))
    })
    .await
}

pub async fn discovered_verifier(provider_url: &str) -> OidcVerifier {
    OidcVerifier::discover(
        provider_url,
        TEST_CLIENT_ID,
        reqwest::Client::new(),
        DEFAULT_CACHE_TTL,
    )
    .await
    .expect("discovery against fake provider")
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims for a token issued by `issuer` that is valid for the next hour.
pub fn valid_claims(issuer: &str, sub: &str, email: &str) -> Value {
    json!({
        "sub": sub,
        "email": email,
        "name": "alice",
        "iss": issuer,
        "aud": TEST_CLIENT_ID,
        "iat": now(),
        "exp": now() + 3600,
    })
}

pub fn sign_with_kid(claims: &Value, kid: Option<&str>) -> String {
    sign_with_pem(claims, kid, SIGNING_KEY_PEM)
}

pub fn sign(claims: &Value) -> String {
    sign_with_kid(claims, Some(FIXTURE_KID))
}

/// Signed with a key that is not in the fixture JWKS, but claiming its kid.
pub fn sign_rogue(claims: &Value) -> String {
    sign_with_pem(claims, Some(FIXTURE_KID), ROGUE_KEY_PEM)
}

fn sign_with_pem(claims: &Value, kid: Option<&str>, pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key parses");
    encode(&header, claims, &key).expect("token signs")
}
