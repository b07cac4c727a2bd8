// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use casdoor_auth_gateway::{
    config::{Config, LogFormat},
    logging, server,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init_tracing(LogFormat::Pretty);
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init_tracing(config.log_format);
    tracing::info!(
        casdoor = %config.casdoor.base_url,
        organization = %config.casdoor.organization,
        store = ?config.store,
        bind = %config.bind_addr,
        "starting casdoor-auth-gateway"
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        signal_token.cancel();
    });

    match server::serve(config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
