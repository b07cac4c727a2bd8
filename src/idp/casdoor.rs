// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Casdoor client: resource-owner password login and admin user creation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{IdentityProvider, ProviderError};
use crate::config::CasdoorConfig;

const TOKEN_PATH: &str = "/api/login/oauth/access_token";
const ADD_USER_PATH: &str = "/api/add-user";
const LOGIN_SCOPE: &str = "openid profile email";

#[derive(Debug, Clone)]
pub struct CasdoorClient {
    config: CasdoorConfig,
    http: Client,
}

/// Token endpoint answer. Casdoor reports failures in-band via `error`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

#[derive(Debug, Deserialize)]
struct AddUserResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    msg: String,
}

impl CasdoorClient {
    pub fn new(config: CasdoorConfig, http: Client) -> Self {
        Self { config, http }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl IdentityProvider for CasdoorClient {
    async fn login(&self, identifier: &str, secret: &str) -> Result<String, ProviderError> {
        let form = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("username", identifier),
            ("password", secret),
            ("scope", LOGIN_SCOPE),
        ];

        let response = self
            .http
            .post(self.endpoint(TOKEN_PATH))
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("token request failed: {e}")))?;

        let status = response.status();
        let token: TokenResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("token endpoint returned {status}: {e}"))
        })?;

        if !token.error.is_empty() {
            let message = if token.error_description.is_empty() {
                token.error
            } else {
                token.error_description
            };
            debug!(%status, reason = %message, "Casdoor refused password login");
            return Err(ProviderError::Rejected(message));
        }

        if token.access_token.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "token response did not include access_token".to_string(),
            ));
        }

        Ok(token.access_token)
    }

    async fn register(
        &self,
        username: &str,
        identifier: &str,
        secret: &str,
    ) -> Result<(), ProviderError> {
        let payload = json!({
            "owner": self.config.organization,
            "name": username,
            "email": identifier,
            "password": secret,
            "signupApplication": self.config.app_name,
        });

        let response = self
            .http
            .post(self.endpoint(ADD_USER_PATH))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("add-user request failed: {e}")))?;

        let status = response.status();
        let result: AddUserResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("add-user endpoint returned {status}: {e}"))
        })?;

        match result.status.as_deref() {
            Some("ok") => {
                info!(username, organization = %self.config.organization, "Casdoor account created");
                Ok(())
            }
            Some(other) => {
                warn!(username, status = other, msg = %result.msg, "Casdoor refused account creation");
                Err(ProviderError::Rejected(result.msg))
            }
            // Only an explicit non-"ok" status is a refusal.
            None => {
                warn!(username, msg = %result.msg, "add-user response carried no status, assuming created");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn;
    use axum::{
        extract::Form,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::Value;
    use std::collections::HashMap;

    fn config(base_url: &str) -> CasdoorConfig {
        CasdoorConfig {
            base_url: base_url.to_string(),
            client_id: "client-123".to_string(),
            client_secret: "s3cret".to_string(),
            organization: "built-in".to_string(),
            app_name: "secure-app".to_string(),
        }
    }

    /// Fake Casdoor: accepts alice@x.com / pw, and knows "taken@x.com" already.
    async fn fake_casdoor() -> String {
        let app = Router::new()
            .route(
                TOKEN_PATH,
                post(|Form(form): Form<HashMap<String, String>>| async move {
                    assert_eq!(form["grant_type"], "password");
                    assert_eq!(form["client_id"], "client-123");
                    assert_eq!(form["client_secret"], "s3cret");
                    assert_eq!(form["scope"], "openid profile email");
                    if form["username"] == "alice@x.com" && form["password"] == "pw" {
                        Json(json!({"access_token": "tok123", "error": ""}))
                    } else if form["username"] == "blank@x.com" {
                        Json(json!({"access_token": "", "error": ""}))
                    } else {
                        Json(json!({
                            "access_token": "",
                            "error": "invalid_grant",
                            "error_description": "invalid username or password"
                        }))
                    }
                }),
            )
            .route(
                ADD_USER_PATH,
                post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    let expected = format!("Basic {}", STANDARD.encode("client-123:s3cret"));
                    if headers.get(AUTHORIZATION).map(|v| v.to_str().unwrap()) != Some(expected.as_str()) {
                        return Json(json!({"status": "error", "msg": "unauthorized"}));
                    }
                    assert_eq!(body["owner"], "built-in");
                    assert_eq!(body["signupApplication"], "secure-app");
                    if body["email"] == "taken@x.com" {
                        Json(json!({"status": "error", "msg": "user already exists"}))
                    } else if body["email"] == "odd@x.com" {
                        Json(json!({"msg": "", "data": "Affected"}))
                    } else {
                        Json(json!({"status": "ok", "msg": ""}))
                    }
                }),
            )
            .route("/broken/api/login/oauth/access_token", post(|| async {
                (StatusCode::BAD_GATEWAY, "<html>upstream down</html>")
            }));
        spawn(app).await
    }

    #[tokio::test]
    async fn login_returns_access_token() {
        let base = fake_casdoor().await;
        let client = CasdoorClient::new(config(&base), Client::new());
        assert_eq!(client.login("alice@x.com", "pw").await.unwrap(), "tok123");
    }

    #[tokio::test]
    async fn login_surfaces_provider_error() {
        let base = fake_casdoor().await;
        let client = CasdoorClient::new(config(&base), Client::new());

        let err = client.login("alice@x.com", "wrong").await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Rejected("invalid username or password".to_string())
        );
    }

    #[tokio::test]
    async fn login_without_token_is_invalid_response() {
        let base = fake_casdoor().await;
        let client = CasdoorClient::new(config(&base), Client::new());

        let err = client.login("blank@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn login_non_json_body_is_invalid_response() {
        let base = fake_casdoor().await;
        let client = CasdoorClient::new(config(&format!("{base}/broken")), Client::new());

        let err = client.login("alice@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_provider_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = CasdoorClient::new(config("http://127.0.0.1:9"), Client::new());

        let err = client.login("alice@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
        let err = client.register("alice", "alice@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }

    #[tokio::test]
    async fn register_succeeds_with_basic_auth() {
        let base = fake_casdoor().await;
        let client = CasdoorClient::new(config(&base), Client::new());
        client.register("alice", "alice@x.com", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn register_conflict_carries_provider_message() {
        let base = fake_casdoor().await;
        let client = CasdoorClient::new(config(&base), Client::new());

        let err = client.register("bob", "taken@x.com", "pw").await.unwrap_err();
        assert_eq!(err, ProviderError::Rejected("user already exists".to_string()));
    }

    #[tokio::test]
    async fn register_without_status_counts_as_created() {
        let base = fake_casdoor().await;
        let client = CasdoorClient::new(config(&base), Client::new());

        client.register("odd", "odd@x.com", "pw").await.unwrap();
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = CasdoorClient::new(config("https://door.example.com/"), Client::new());
        assert_eq!(
            client.endpoint(TOKEN_PATH),
            "https://door.example.com/api/login/oauth/access_token"
        );
    }
}
