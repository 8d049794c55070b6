//! Keyserver validation cache.
//!
//! Resolves a fingerprint to `{status, key material}` against the upstream
//! keyserver, with a TTL'd cache persisted in SQLite. Only resolutions that
//! actually retrieved key bytes (valid or revoked) are cached; a bare
//! not-found answer is never cached, so repeat queries for an absent
//! fingerprint always re-fetch.

use crate::clock::Clock;
use crate::error::{KeyError, KeyResult};
use crate::fingerprint::Fingerprint;
use crate::keyserver::{Keyserver, KeyserverResponse};
use crate::storage::SqliteStorage;
use pgp::composed::{Deserializable, SignedPublicKey};
use std::fmt;
use std::sync::Arc;

/// Validation status of a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// The key exists on the keyserver and carries no revocation.
    Valid,
    /// The key exists but has been revoked.
    Revoked,
    /// The keyserver has no key for this fingerprint.
    NotFound,
}

impl KeyStatus {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Revoked => "revoked",
            Self::NotFound => "not_found",
        }
    }

    /// Parse the database representation. Unknown values degrade to
    /// `NotFound` rather than trusting a corrupted row.
    pub(crate) fn from_db(value: &str) -> Self {
        match value {
            "valid" => Self::Valid,
            "revoked" => Self::Revoked,
            _ => Self::NotFound,
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a key resolution.
#[derive(Debug)]
pub struct KeyValidation {
    /// Validation status.
    pub status: KeyStatus,
    /// Parsed key material, present whenever the keyserver returned bytes.
    pub key: Option<SignedPublicKey>,
}

impl KeyValidation {
    fn not_found() -> Self {
        Self {
            status: KeyStatus::NotFound,
            key: None,
        }
    }
}

/// TTL'd keyserver validation cache.
pub struct KeyValidationCache {
    storage: Arc<SqliteStorage>,
    keyserver: Arc<dyn Keyserver>,
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
}

impl KeyValidationCache {
    /// Create a cache over the given storage and keyserver connection.
    pub fn new(
        storage: Arc<SqliteStorage>,
        keyserver: Arc<dyn Keyserver>,
        clock: Arc<dyn Clock>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            storage,
            keyserver,
            clock,
            ttl_secs: ttl_secs as i64,
        }
    }

    /// Resolve a fingerprint to its validation status and key material.
    ///
    /// Input is normalized (uppercase, `0x` stripped); an empty fingerprint
    /// resolves immediately to `not_found` with no cache or network access.
    /// A cache hit younger than the TTL is served without any network call.
    pub async fn resolve(&self, raw_fingerprint: &str) -> KeyResult<KeyValidation> {
        let Some(fingerprint) = Fingerprint::normalize(raw_fingerprint) else {
            return Ok(KeyValidation::not_found());
        };

        if let Some(cached) = self.storage.key_cache_get(fingerprint.as_str()).await? {
            let age = self.clock.now_unix() - cached.validated_at;
            if age < self.ttl_secs {
                tracing::debug!(fingerprint = %fingerprint, status = %cached.status, "key cache hit");
                let key = parse_key(&cached.armored_key)?;
                return Ok(KeyValidation {
                    status: cached.status,
                    key: Some(key),
                });
            }
        }

        match self.keyserver.fetch_by_fingerprint(fingerprint.as_str()).await? {
            KeyserverResponse::NotFound => {
                // Not cached: the next lookup for this fingerprint goes
                // upstream again.
                tracing::debug!(fingerprint = %fingerprint, "keyserver has no key");
                Ok(KeyValidation::not_found())
            }
            KeyserverResponse::Found(armored) => {
                let key = parse_key(&armored)?;
                let status = if is_revoked(&key) {
                    KeyStatus::Revoked
                } else {
                    KeyStatus::Valid
                };

                self.storage
                    .key_cache_put(fingerprint.as_str(), &armored, status, self.clock.now_unix())
                    .await?;

                tracing::info!(fingerprint = %fingerprint, %status, "key validated against keyserver");
                Ok(KeyValidation {
                    status,
                    key: Some(key),
                })
            }
        }
    }
}

fn parse_key(armored: &str) -> KeyResult<SignedPublicKey> {
    let (key, _headers) =
        SignedPublicKey::from_string(armored).map_err(|e| KeyError::BadKeyData(e.to_string()))?;
    Ok(key)
}

/// A key carrying any revocation certificate is treated as revoked.
fn is_revoked(key: &SignedPublicKey) -> bool {
    !key.details.revocation_signatures.is_empty()
}
