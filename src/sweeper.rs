//! Background retention sweeper.
//!
//! Runs periodically to delete messages that were never collected before the
//! retention window elapsed. The first sweep runs immediately at startup so a
//! restarted relay does not carry stale mailboxes for a full interval.

use crate::clock::Clock;
use crate::config::RetentionConfig;
use crate::storage::{MessageStore, SqliteStorage};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Spawn the background retention sweeper.
///
/// Returns a handle that can be used to abort the task.
pub fn spawn_sweeper(
    storage: Arc<SqliteStorage>,
    clock: Arc<dyn Clock>,
    config: RetentionConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enabled {
            tracing::info!("Retention sweeper disabled");
            return;
        }

        tracing::info!(
            "Retention sweeper started (window: {}s, interval: {}s)",
            config.window_secs,
            config.sweep_interval_secs
        );

        // The first tick fires immediately.
        let mut timer = interval(Duration::from_secs(config.sweep_interval_secs));

        loop {
            timer.tick().await;

            let cutoff = clock.now_unix() - config.window_secs as i64;
            match storage.sweep_older_than(cutoff).await {
                Ok(deleted) => {
                    if deleted > 0 {
                        tracing::info!("Sweep: deleted {} expired messages", deleted);
                    } else {
                        tracing::debug!("Sweep: no expired messages");
                    }
                }
                Err(e) => {
                    tracing::error!("Sweep error: {}", e);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fingerprint::Fingerprint;
    use crate::testkeys;

    #[tokio::test]
    async fn sweeper_task_removes_expired_messages() {
        let clock = Arc::new(FixedClock::new(testkeys::NOW));
        let storage = Arc::new(SqliteStorage::in_memory(clock.clone()).await.unwrap());
        let from = Fingerprint::parse(testkeys::ALICE_FPR).unwrap();
        let to = Fingerprint::parse(testkeys::BOB_FPR).unwrap();

        storage.enqueue(&from, &to, "stale").await.unwrap();

        // Move past the retention window and sweep directly.
        clock.advance(8 * 24 * 60 * 60);
        let cutoff = clock.now_unix() - 7 * 24 * 60 * 60;
        let deleted = storage.sweep_older_than(cutoff).await.unwrap();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn sweeper_first_tick_runs_at_startup() {
        let clock = Arc::new(FixedClock::new(testkeys::NOW));
        let storage = Arc::new(SqliteStorage::in_memory(clock.clone()).await.unwrap());
        let from = Fingerprint::parse(testkeys::ALICE_FPR).unwrap();
        let to = Fingerprint::parse(testkeys::BOB_FPR).unwrap();
        storage.enqueue(&from, &to, "stale").await.unwrap();

        // Window of zero makes the startup sweep delete everything.
        clock.advance(1);
        let config = RetentionConfig {
            window_secs: 0,
            sweep_interval_secs: 3600,
            enabled: true,
        };

        let handle = spawn_sweeper(storage.clone(), clock.clone(), config);
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let messages = storage.collect(&to).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn sweeper_task_disabled() {
        let clock = Arc::new(FixedClock::new(testkeys::NOW));
        let storage = Arc::new(SqliteStorage::in_memory(clock.clone()).await.unwrap());
        let config = RetentionConfig {
            window_secs: 3600,
            sweep_interval_secs: 1,
            enabled: false,
        };

        let handle = spawn_sweeper(storage, clock, config);

        // Task should complete immediately when disabled
        tokio::time::timeout(Duration::from_millis(100), handle)
            .await
            .expect("Task should complete when disabled")
            .expect("Task should not panic");
    }
}
