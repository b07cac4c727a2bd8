// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cached copy of the provider's signing keys.
//!
//! A snapshot of the key set is kept for `ttl`. Lookups for a `kid` that is
//! not in the snapshot trigger a reload (the provider rotated keys), but no
//! more than once per `rotation_cooldown`. When a reload fails and an older
//! snapshot exists, the older snapshot keeps serving.
//!
//! Snapshots are immutable and handed out as `Arc`s. Only one download runs
//! at a time; while it is in flight, callers holding a previous snapshot keep
//! verifying against it instead of queueing behind the download. A failed
//! reload is not retried until `rotation_cooldown` has passed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::error::AuthError;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

const DEFAULT_ROTATION_COOLDOWN: Duration = Duration::from_secs(30);

/// A verification key together with the algorithm it is used with.
pub struct ResolvedKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

struct Snapshot {
    keys: Arc<JwkSet>,
    loaded_at: Instant,
    failed_at: Option<Instant>,
}

impl Snapshot {
    fn last_attempt(&self) -> Instant {
        self.failed_at
            .map_or(self.loaded_at, |failed| failed.max(self.loaded_at))
    }
}

#[derive(Clone)]
pub struct JwksCache {
    url: String,
    ttl: Duration,
    rotation_cooldown: Duration,
    client: reqwest::Client,
    current: Arc<RwLock<Option<Snapshot>>>,
    refreshing: Arc<Mutex<()>>,
}

impl JwksCache {
    /// `client` should already carry a request timeout.
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            ttl: DEFAULT_CACHE_TTL,
            rotation_cooldown: DEFAULT_ROTATION_COOLDOWN,
            client,
            current: Arc::new(RwLock::new(None)),
            refreshing: Arc::new(Mutex::new(())),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Minimum spacing between downloads forced by an unknown `kid` or
    /// retried after a failure.
    pub fn rotation_cooldown(mut self, cooldown: Duration) -> Self {
        self.rotation_cooldown = cooldown;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resolve the key for `kid`, or the first usable key when the token
    /// names none.
    pub async fn key_for(&self, kid: Option<&str>) -> Result<ResolvedKey, AuthError> {
        let keys = self.current_keys().await?;

        let Some(kid) = kid else {
            return keys
                .keys
                .iter()
                .find_map(|jwk| resolve(jwk).ok())
                .ok_or(AuthError::UnknownKey);
        };

        if let Some(jwk) = keys.find(kid) {
            return resolve(jwk);
        }

        let _refresh = self.refreshing.lock().await;
        // Another caller may have reloaded while we waited.
        if let Some((keys, _)) = self.snapshot().await {
            if let Some(jwk) = keys.find(kid) {
                return resolve(jwk);
            }
        }
        if !self.rotation_allowed().await {
            debug!(kid, "unknown key id, reload still cooling down");
            return Err(AuthError::UnknownKey);
        }

        debug!(kid, "unknown key id, reloading key set");
        let keys = match self.download().await {
            Ok(keys) => self.replace(keys).await,
            Err(e) => {
                self.mark_failed().await;
                return Err(e);
            }
        };
        keys.find(kid).ok_or(AuthError::UnknownKey).and_then(resolve)
    }

    /// Unconditionally download and install a fresh key set.
    pub async fn reload(&self) -> Result<(), AuthError> {
        let _refresh = self.refreshing.lock().await;
        match self.download().await {
            Ok(keys) => {
                self.replace(keys).await;
                Ok(())
            }
            Err(e) => {
                self.mark_failed().await;
                Err(e)
            }
        }
    }

    /// True while a snapshot younger than the TTL is held.
    pub async fn is_fresh(&self) -> bool {
        matches!(self.snapshot().await, Some((_, age)) if age < self.ttl)
    }

    async fn snapshot(&self) -> Option<(Arc<JwkSet>, Duration)> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|snap| (Arc::clone(&snap.keys), snap.loaded_at.elapsed()))
    }

    /// Keys that can be served without a download: a fresh snapshot, or a
    /// stale one whose last reload failed within the cooldown.
    async fn servable(&self) -> Option<Arc<JwkSet>> {
        let current = self.current.read().await;
        let snap = current.as_ref()?;
        let fresh = snap.loaded_at.elapsed() < self.ttl;
        let backing_off = snap
            .failed_at
            .is_some_and(|failed| failed.elapsed() < self.rotation_cooldown);
        (fresh || backing_off).then(|| Arc::clone(&snap.keys))
    }

    async fn replace(&self, keys: JwkSet) -> Arc<JwkSet> {
        let keys = Arc::new(keys);
        *self.current.write().await = Some(Snapshot {
            keys: Arc::clone(&keys),
            loaded_at: Instant::now(),
            failed_at: None,
        });
        keys
    }

    async fn mark_failed(&self) {
        if let Some(snap) = self.current.write().await.as_mut() {
            snap.failed_at = Some(Instant::now());
        }
    }

    async fn current_keys(&self) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(keys) = self.servable().await {
            return Ok(keys);
        }

        let _refresh = match self.refreshing.try_lock() {
            Ok(guard) => guard,
            // A reload is already running; serve what we have meanwhile.
            Err(_) => match self.snapshot().await {
                Some((stale, _)) => return Ok(stale),
                None => self.refreshing.lock().await,
            },
        };
        if let Some(keys) = self.servable().await {
            return Ok(keys);
        }

        match self.download().await {
            Ok(keys) => Ok(self.replace(keys).await),
            Err(e) => {
                self.mark_failed().await;
                match self.snapshot().await {
                    Some((stale, age)) => {
                        warn!(error = %e, age_secs = age.as_secs(), "key set reload failed, keeping previous keys");
                        Ok(stale)
                    }
                    None => Err(e),
                }
            }
        }
    }

    async fn rotation_allowed(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .map_or(true, |snap| snap.last_attempt().elapsed() >= self.rotation_cooldown)
    }

    async fn download(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::KeyFetch(format!(
                "{} answered HTTP {status}",
                self.url
            )));
        }

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(format!("undecodable key set: {e}")))?;
        debug!(keys = keys.keys.len(), url = %self.url, "key set downloaded");
        Ok(keys)
    }
}

fn resolve(jwk: &Jwk) -> Result<ResolvedKey, AuthError> {
    let declared = jwk.common.key_algorithm;
    let (key, algorithm) = match &jwk.algorithm {
        AlgorithmParameters::RSA(params) => (
            DecodingKey::from_rsa_components(&params.n, &params.e),
            match declared {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            },
        ),
        AlgorithmParameters::EllipticCurve(params) => (
            DecodingKey::from_ec_components(&params.x, &params.y),
            match declared {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            },
        ),
        _ => {
            return Err(AuthError::Internal(format!(
                "key {:?} has an unsupported key type",
                jwk.common.key_id
            )))
        }
    };

    let key = key.map_err(|e| AuthError::Internal(format!("unusable key: {e}")))?;
    Ok(ResolvedKey { key, algorithm })
}
