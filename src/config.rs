// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded once from the environment at startup and injected
//! into the gateway, the Casdoor client and the user store.
//!
//! Only the process environment is read; a `.env` file is not loaded. Export
//! the variables (or use the shell's `set -a; . ./.env`) before starting.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CASDOOR_URL` | Casdoor base URL (also the expected token issuer) | Required |
//! | `CLIENT_ID` | Casdoor application client id (expected token audience) | Required |
//! | `CLIENT_SECRET` | Casdoor application client secret | Required |
//! | `ORGANIZATION` | Casdoor organization owning new accounts | Required |
//! | `APP_NAME` | Casdoor application recorded as signup application | Required |
//! | `STORE_BACKEND` | `postgres` or `memory` | `postgres` |
//! | `DATABASE_URL` | Postgres connection string | Required for `postgres` |
//! | `DB_MAX_CONNECTIONS` | Pool size | `10` |
//! | `DB_CONNECT_TIMEOUT_SECS` | Pool acquire timeout | `5` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `50051` |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache lifetime | `300` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const CASDOOR_URL_ENV: &str = "CASDOOR_URL";
pub const CLIENT_ID_ENV: &str = "CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "CLIENT_SECRET";
pub const ORGANIZATION_ENV: &str = "ORGANIZATION";
pub const APP_NAME_ENV: &str = "APP_NAME";
pub const STORE_BACKEND_ENV: &str = "STORE_BACKEND";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const DB_MAX_CONNECTIONS_ENV: &str = "DB_MAX_CONNECTIONS";
pub const DB_CONNECT_TIMEOUT_ENV: &str = "DB_CONNECT_TIMEOUT_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 50051;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Casdoor connection settings.
#[derive(Clone)]
pub struct CasdoorConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub organization: String,
    pub app_name: String,
}

impl std::fmt::Debug for CasdoorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CasdoorConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("organization", &self.organization)
            .field("app_name", &self.app_name)
            .finish()
    }
}

/// Where local user records live.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres {
        url: String,
        max_connections: u32,
        connect_timeout: Duration,
    },
    /// Process-local store for development; records vanish on restart.
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Postgres {
                max_connections,
                connect_timeout,
                ..
            } => f
                .debug_struct("Postgres")
                .field("url", &"<redacted>")
                .field("max_connections", max_connections)
                .field("connect_timeout", connect_timeout)
                .finish(),
            StoreConfig::Memory => f.write_str("Memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("expected `json` or `pretty`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub casdoor: CasdoorConfig,
    pub store: StoreConfig,
    pub bind_addr: SocketAddr,
    pub jwks_cache_ttl: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let casdoor = CasdoorConfig {
            base_url: parse_base_url(&env.required(CASDOOR_URL_ENV)?)?,
            client_id: env.required(CLIENT_ID_ENV)?,
            client_secret: env.required(CLIENT_SECRET_ENV)?,
            organization: env.required(ORGANIZATION_ENV)?,
            app_name: env.required(APP_NAME_ENV)?,
        };

        let store = match env.or_default(STORE_BACKEND_ENV, "postgres").as_str() {
            "postgres" => StoreConfig::Postgres {
                url: env.required(DATABASE_URL_ENV)?,
                max_connections: env.parsed(DB_MAX_CONNECTIONS_ENV, DEFAULT_DB_MAX_CONNECTIONS)?,
                connect_timeout: Duration::from_secs(
                    env.parsed(DB_CONNECT_TIMEOUT_ENV, DEFAULT_DB_CONNECT_TIMEOUT_SECS)?,
                ),
            },
            "memory" => StoreConfig::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: STORE_BACKEND_ENV,
                    reason: format!("expected `postgres` or `memory`, got `{other}`"),
                })
            }
        };

        let host = env.or_default(HOST_ENV, DEFAULT_HOST);
        let port: u16 = env.parsed(PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV,
                reason: e.to_string(),
            })?;

        Ok(Self {
            casdoor,
            store,
            bind_addr,
            jwks_cache_ttl: Duration::from_secs(
                env.parsed(JWKS_CACHE_TTL_ENV, DEFAULT_JWKS_CACHE_TTL_SECS)?,
            ),
            log_format: env.parsed(LOG_FORMAT_ENV, LogFormat::Pretty)?,
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name: CASDOOR_URL_ENV,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            name: CASDOOR_URL_ENV,
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}
