//! SQLite storage backend for drop-relay.

use super::{CachedKey, MessageStore, StoredMessage};
use crate::clock::Clock;
use crate::error::StorageError;
use crate::fingerprint::Fingerprint;
use crate::keycache::KeyStatus;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// SQLite-based mailbox and key-cache storage.
///
/// Uses WAL mode for concurrent reads/writes.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").finish_non_exhaustive()
    }
}

impl SqliteStorage {
    /// Create a new SQLite storage from a database path.
    ///
    /// Creates the database file if it doesn't exist.
    pub async fn new(path: &Path, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(path.to_str().unwrap_or("drop-relay.db"))
            .map_err(StorageError::Database)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let storage = Self { pool, clock };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Create an in-memory SQLite storage (for testing).
    pub async fn in_memory(clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(":memory:")
            .map_err(StorageError::Database)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let storage = Self { pool, clock };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_fingerprint TEXT NOT NULL,
                to_fingerprint TEXT NOT NULL,
                encrypted_payload TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS key_cache (
                fingerprint TEXT PRIMARY KEY,
                armored_key TEXT NOT NULL,
                status TEXT NOT NULL,
                validated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(to_fingerprint)",
        )
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created_at)")
            .execute(&self.pool)
            .await
            .map_err(StorageError::Database)?;

        Ok(())
    }

    /// Look up a cached key validation.
    pub async fn key_cache_get(&self, fingerprint: &str) -> Result<Option<CachedKey>, StorageError> {
        let row = sqlx::query_as::<_, KeyCacheRow>(
            "SELECT armored_key, status, validated_at FROM key_cache WHERE fingerprint = ?1",
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(row.map(Into::into))
    }

    /// Upsert a key validation: the whole row is replaced, never patched.
    /// Concurrent writers for the same fingerprint race harmlessly
    /// (last-writer-wins, all writes carry the same upstream truth).
    pub async fn key_cache_put(
        &self,
        fingerprint: &str,
        armored_key: &str,
        status: KeyStatus,
        validated_at: i64,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO key_cache (fingerprint, armored_key, status, validated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(fingerprint) DO UPDATE SET
                armored_key = excluded.armored_key,
                status = excluded.status,
                validated_at = excluded.validated_at
            "#,
        )
        .bind(fingerprint)
        .bind(armored_key)
        .bind(status.as_str())
        .bind(validated_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(())
    }

    /// Count of messages currently queued across all mailboxes (for metrics).
    pub async fn pending_messages(&self) -> Result<i64, StorageError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Database)
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn enqueue(
        &self,
        from: &Fingerprint,
        to: &Fingerprint,
        encrypted_payload: &str,
    ) -> Result<i64, StorageError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO messages (from_fingerprint, to_fingerprint, encrypted_payload, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
            "#,
        )
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(encrypted_payload)
        .bind(self.clock.now_unix())
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(id)
    }

    async fn collect(&self, recipient: &Fingerprint) -> Result<Vec<StoredMessage>, StorageError> {
        // A single DELETE .. RETURNING keeps the select-and-delete atomic:
        // concurrent collects for the same recipient partition the mailbox
        // instead of both receiving the same rows.
        let mut rows = sqlx::query_as::<_, MessageRow>(
            r#"
            DELETE FROM messages
            WHERE to_fingerprint = ?1
            RETURNING id, from_fingerprint, encrypted_payload, created_at
            "#,
        )
        .bind(recipient.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        // RETURNING carries no ordering guarantee.
        rows.sort_by_key(|row| row.id);
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn sweep_older_than(&self, cutoff: i64) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM messages WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Database)?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Database)?;
        Ok(())
    }
}

/// Internal row type for message queries.
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    from_fingerprint: String,
    encrypted_payload: String,
    created_at: i64,
}

impl From<MessageRow> for StoredMessage {
    fn from(row: MessageRow) -> Self {
        StoredMessage {
            id: row.id,
            from_fingerprint: row.from_fingerprint,
            encrypted_payload: row.encrypted_payload,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for key-cache queries.
#[derive(sqlx::FromRow)]
struct KeyCacheRow {
    armored_key: String,
    status: String,
    validated_at: i64,
}

impl From<KeyCacheRow> for CachedKey {
    fn from(row: KeyCacheRow) -> Self {
        CachedKey {
            armored_key: row.armored_key,
            status: KeyStatus::from_db(&row.status),
            validated_at: row.validated_at,
        }
    }
}
