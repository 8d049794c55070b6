//! Storage layer for drop-relay.
//!
//! Two tables back the relay: per-recipient mailboxes (`messages`) and the
//! keyserver validation cache (`key_cache`).

mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::StorageError;
use crate::fingerprint::Fingerprint;
use crate::keycache::KeyStatus;
use async_trait::async_trait;

/// A message queued for a recipient.
///
/// Immutable once created; it leaves the store either through a poll that
/// collects it or through the retention sweeper.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// Monotonic message id (insertion order within a mailbox).
    pub id: i64,
    /// Verified fingerprint of the sender.
    pub from_fingerprint: String,
    /// Opaque encrypted payload; the relay never inspects it.
    pub encrypted_payload: String,
    /// Unix timestamp assigned by the store at enqueue time.
    pub created_at: i64,
}

/// A cached keyserver resolution.
#[derive(Debug, Clone)]
pub struct CachedKey {
    /// Armored public key material as fetched.
    pub armored_key: String,
    /// Validation status at fetch time.
    pub status: KeyStatus,
    /// Unix timestamp of the fetch; drives TTL expiry.
    pub validated_at: i64,
}

/// Trait for mailbox storage backends.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Durably insert a message. The store stamps `created_at` from its own
    /// clock, not from the caller.
    ///
    /// Returns the assigned message id.
    async fn enqueue(
        &self,
        from: &Fingerprint,
        to: &Fingerprint,
        encrypted_payload: &str,
    ) -> Result<i64, StorageError>;

    /// Atomically collect and delete every message queued for a recipient.
    ///
    /// Two concurrent collects for the same recipient never both receive the
    /// same message. Messages come back in insertion order.
    async fn collect(&self, recipient: &Fingerprint) -> Result<Vec<StoredMessage>, StorageError>;

    /// Delete every message created before `cutoff` (unix seconds),
    /// collected or not.
    ///
    /// Returns the number of messages deleted.
    async fn sweep_older_than(&self, cutoff: i64) -> Result<u64, StorageError>;

    /// Trivial round-trip against the backend, for health probes.
    async fn ping(&self) -> Result<(), StorageError>;
}
