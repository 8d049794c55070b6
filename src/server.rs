//! RelayService orchestration.
//!
//! Wires the identity verifier, key cache, and message store into the two
//! protocol operations (Send and Poll) plus the health probe, and maps every
//! domain failure onto the wire-level [`ApiError`] taxonomy.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{ApiError, StorageError, VerifyError};
use crate::fingerprint::Fingerprint;
use crate::identity::IdentityVerifier;
use crate::keycache::{KeyStatus, KeyValidationCache};
use crate::keyserver::Keyserver;
use crate::storage::{MessageStore, SqliteStorage, StoredMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
/// Thread-safe via `AtomicU64` — no locks needed for incrementing.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total messages accepted by Send.
    pub sends_total: AtomicU64,
    /// Total Poll requests answered.
    pub polls_total: AtomicU64,
    /// Total messages handed out by Poll.
    pub messages_delivered: AtomicU64,
    /// Total signature/timestamp rejections.
    pub auth_failures: AtomicU64,
    /// Total storage or upstream failures surfaced as 500.
    pub errors_total: AtomicU64,
}

/// The relay's trust and delivery engine.
pub struct RelayService {
    config: Config,
    storage: Arc<SqliteStorage>,
    keys: Arc<KeyValidationCache>,
    verifier: IdentityVerifier,
    metrics: RelayMetrics,
}

impl std::fmt::Debug for RelayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayService")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl RelayService {
    /// Assemble the service from its collaborators.
    pub fn new(
        config: Config,
        storage: Arc<SqliteStorage>,
        keyserver: Arc<dyn Keyserver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let keys = Arc::new(KeyValidationCache::new(
            storage.clone(),
            keyserver,
            clock.clone(),
            config.keyserver.cache_ttl_secs,
        ));
        let verifier = IdentityVerifier::new(keys.clone(), clock, config.auth.timestamp_skew_secs);

        Self {
            config,
            storage,
            keys,
            verifier,
            metrics: RelayMetrics::default(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the storage layer.
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Get a clone of the storage Arc for background tasks.
    pub fn storage_arc(&self) -> Arc<SqliteStorage> {
        self.storage.clone()
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Handle a Send: authenticate the sender from the detached signature,
    /// re-validate both keys, and enqueue the payload.
    ///
    /// Returns the stored message id.
    pub async fn send(
        &self,
        to_public_key: &str,
        encrypted_data: &str,
        timestamp: i64,
        signature: &str,
    ) -> Result<i64, ApiError> {
        let to = Fingerprint::parse(to_public_key).map_err(|_| {
            tracing::warn!("send rejected: malformed recipient fingerprint");
            ApiError::InvalidFingerprintFormat
        })?;

        if encrypted_data.len() > self.config.storage.max_payload_bytes {
            tracing::warn!(size = encrypted_data.len(), "send rejected: payload too large");
            return Err(ApiError::PayloadTooLarge);
        }

        // The signature covers the exact request fields, pre-normalization.
        let signed_data = format!("{to_public_key}|{encrypted_data}|{timestamp}");
        let from = self
            .verifier
            .verify(signature, &signed_data, timestamp)
            .await
            .map_err(|e| self.map_verify_error(e, ApiError::SenderKeyInvalid))?;

        if self.resolve_status(from.as_str()).await? != KeyStatus::Valid {
            tracing::warn!(sender = %from, "send rejected: sender key not valid");
            return Err(ApiError::SenderKeyInvalid);
        }
        if self.resolve_status(to.as_str()).await? != KeyStatus::Valid {
            tracing::warn!(recipient = %to, "send rejected: recipient key not valid");
            return Err(ApiError::RecipientKeyInvalid);
        }

        let id = self
            .storage
            .enqueue(&from, &to, encrypted_data)
            .await
            .map_err(|e| self.storage_error(e))?;

        self.metrics.sends_total.fetch_add(1, Ordering::Relaxed);
        tracing::info!(from = %from, to = %to, id, "message stored");
        Ok(id)
    }

    /// Handle a Poll: whoever can sign the timestamp owns the mailbox.
    ///
    /// Collects and deletes every queued message for the requester.
    pub async fn poll(
        &self,
        timestamp: i64,
        signature: &str,
    ) -> Result<Vec<StoredMessage>, ApiError> {
        let requester = self
            .verifier
            .verify(signature, &timestamp.to_string(), timestamp)
            .await
            .map_err(|e| self.map_verify_error(e, ApiError::RequesterKeyInvalid))?;

        if self.resolve_status(requester.as_str()).await? != KeyStatus::Valid {
            tracing::warn!(requester = %requester, "poll rejected: key not valid");
            return Err(ApiError::RequesterKeyInvalid);
        }

        let messages = self
            .storage
            .collect(&requester)
            .await
            .map_err(|e| self.storage_error(e))?;

        self.metrics.polls_total.fetch_add(1, Ordering::Relaxed);
        if messages.is_empty() {
            tracing::debug!(requester = %requester, "no messages queued");
        } else {
            self.metrics
                .messages_delivered
                .fetch_add(messages.len() as u64, Ordering::Relaxed);
            tracing::info!(requester = %requester, count = messages.len(), "messages collected");
        }
        Ok(messages)
    }

    /// Round-trip the storage backend.
    pub async fn health(&self) -> Result<(), StorageError> {
        self.storage.ping().await
    }

    async fn resolve_status(&self, fingerprint: &str) -> Result<KeyStatus, ApiError> {
        self.keys.resolve(fingerprint).await.map(|v| v.status).map_err(|e| {
            tracing::error!(fingerprint, "key resolution failed: {e}");
            self.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
            ApiError::Internal
        })
    }

    fn map_verify_error(&self, err: VerifyError, key_invalid: ApiError) -> ApiError {
        match err {
            VerifyError::InvalidSignature => {
                self.metrics.auth_failures.fetch_add(1, Ordering::Relaxed);
                ApiError::InvalidSignature
            }
            VerifyError::ExpiredTimestamp => {
                self.metrics.auth_failures.fetch_add(1, Ordering::Relaxed);
                ApiError::ExpiredTimestamp
            }
            // Revoked and unknown signer keys surface as the operation's
            // key-not-valid answer, indistinguishable to the caller.
            VerifyError::UnknownOrInvalidKey => key_invalid,
            VerifyError::Key(e) => {
                tracing::error!("key resolution failed during verification: {e}");
                self.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
                ApiError::Internal
            }
        }
    }

    fn storage_error(&self, err: StorageError) -> ApiError {
        tracing::error!("storage failure: {err}");
        self.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
        ApiError::Internal
    }
}
