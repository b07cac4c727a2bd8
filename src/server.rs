// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process wiring: build the components from [`Config`], bind, serve until
//! the shutdown token fires.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{public_methods, router};
use crate::auth::{AuthError, AuthGateway, OidcVerifier, TokenVerifier};
use crate::config::{Config, ConfigError, StoreConfig};
use crate::idp::{http_client, CasdoorClient, IdentityProvider, ProviderError};
use crate::service::AuthService;
use crate::state::AppState;
use crate::users::{InMemoryUserStore, PgUserStore, StoreError, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("identity provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("OIDC discovery failed: {0}")]
    Discovery(#[from] AuthError),

    #[error("user store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discover the provider, connect the store and assemble the app state.
pub async fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let http = http_client()?;

    let verifier = OidcVerifier::discover(
        &config.casdoor.base_url,
        &config.casdoor.client_id,
        http.clone(),
        config.jwks_cache_ttl,
    )
    .await?;
    let jwks = verifier.jwks();
    let verifier: Arc<dyn TokenVerifier> = Arc::new(verifier);

    let users: Arc<dyn UserStore> = match &config.store {
        StoreConfig::Postgres {
            url,
            max_connections,
            connect_timeout,
        } => {
            let store = PgUserStore::connect(url, *max_connections, *connect_timeout).await?;
            store.ping().await?;
            info!(max_connections, "connected to PostgreSQL user store");
            Arc::new(store)
        }
        StoreConfig::Memory => {
            info!("using in-memory user store; records are lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let idp: Arc<dyn IdentityProvider> =
        Arc::new(CasdoorClient::new(config.casdoor.clone(), http));
    let service = AuthService::new(idp, verifier.clone(), users);

    let public = public_methods();
    info!(methods = ?public.iter().collect::<Vec<_>>(), "public methods");
    let gateway = Arc::new(AuthGateway::new(public, verifier));

    Ok(AppState::new(service, gateway).with_jwks(jwks))
}

/// Serve on an already-bound listener until `shutdown` is cancelled.
/// In-flight calls are allowed to finish.
pub async fn serve_on(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    let addr = listener.local_addr()?;
    info!(%addr, "SecureService listening (docs at /docs)");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("server stopped");
    Ok(())
}

pub async fn serve(config: Config, shutdown: CancellationToken) -> Result<(), StartupError> {
    let state = build_state(&config).await?;
    let listener = TcpListener::bind(config.bind_addr).await?;
    serve_on(listener, state, shutdown).await
}

/// Resolve on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
