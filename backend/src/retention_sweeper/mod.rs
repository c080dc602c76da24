//! Periodic deletion of photos past their retention age

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use photo_storage::{PhotoStorage, PhotoStorageResult};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Photos older than this are deleted
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Time between two sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Retention settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Whether the sweeper runs at all
    pub enabled: bool,
    /// Maximum photo age; strictly older photos are deleted
    pub max_age: chrono::Duration,
    /// Time between sweeps. The first sweep runs at startup.
    pub interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age: chrono::Duration::days(DEFAULT_MAX_AGE_DAYS),
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Outcome of a single sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Photos listed
    pub examined: usize,
    /// Expired photos deleted by this sweep
    pub deleted: usize,
    /// Expired photos that vanished before we could delete them
    pub already_gone: usize,
    /// Expired photos whose deletion failed
    pub failed: usize,
}

/// Background task enforcing the retention policy on a photo storage
pub struct RetentionSweeper {
    storage: Arc<dyn PhotoStorage>,
    policy: RetentionPolicy,
    shutdown: CancellationToken,
}

impl RetentionSweeper {
    /// Creates a new `RetentionSweeper`
    #[must_use]
    pub fn new(
        storage: Arc<dyn PhotoStorage>,
        policy: RetentionPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            storage,
            policy,
            shutdown,
        }
    }

    /// Sweeps immediately, then every `policy.interval` until shutdown
    pub async fn start(self) {
        info!(
            backend = %self.storage.kind(),
            max_age_days = self.policy.max_age.num_days(),
            interval_secs = self.policy.interval.as_secs(),
            "Starting RetentionSweeper"
        );

        let mut ticker = tokio::time::interval(self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        result = self.sweep_once(Utc::now()) => match result {
                            Ok(report) => info!(?report, "Retention sweep finished"),
                            Err(e) => error!(error = %e, "Retention sweep failed to list photos"),
                        },
                        () = self.shutdown.cancelled() => {
                            info!("RetentionSweeper interrupted mid-sweep, shutting down");
                            break;
                        }
                    }
                }
                () = self.shutdown.cancelled() => {
                    info!("RetentionSweeper shutting down");
                    break;
                }
            }
        }
    }

    /// Deletes every photo older than the policy's maximum age at `now`.
    ///
    /// Only the listing can fail the sweep. Per-photo delete failures are
    /// logged and counted, and a photo that is already gone counts as done.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the photos cannot be listed
    #[instrument(skip(self))]
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> PhotoStorageResult<SweepReport> {
        let photos = self.storage.list_all().await?;
        let mut report = SweepReport {
            examined: photos.len(),
            ..SweepReport::default()
        };

        let expired = photos.into_iter().filter(|photo| {
            photo
                .age_at(now)
                .is_some_and(|age| age > self.policy.max_age)
        });

        for photo in expired {
            match self.storage.delete(&photo.identifier).await {
                Ok(()) => {
                    report.deleted += 1;
                    info!("Deleted expired photo: {}", photo.identifier);
                }
                Err(e) if e.is_not_found() => {
                    report.already_gone += 1;
                    debug!("Expired photo already gone: {}", photo.identifier);
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(error = %e, "Failed to delete expired photo: {}", photo.identifier);
                }
            }
        }

        Ok(report)
    }
}
