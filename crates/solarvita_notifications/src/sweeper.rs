//! Scheduled deletion of notifications past the retention window.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use solarvita_common::{NotificationRepository, SolarvitaError};
use solarvita_config::{NotificationsConfig, MAX_RETENTION_DAYS};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Result of one sweep.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub deleted: u64,
    pub users: usize,
    /// Users whose records could not be swept
    pub failed_users: Vec<String>,
}

impl SweepReport {
    pub fn is_success(&self) -> bool {
        self.failed_users.is_empty()
    }
}

pub struct RetentionSweeper {
    notifications: Arc<dyn NotificationRepository>,
    retention: Duration,
    max_batch_size: usize,
}

impl RetentionSweeper {
    pub fn new(notifications: Arc<dyn NotificationRepository>, config: &NotificationsConfig) -> Self {
        Self {
            notifications,
            // load_config rejects these values; clamp configs built in code
            retention: Duration::days(config.retention_days.clamp(1, MAX_RETENTION_DAYS)),
            max_batch_size: config.max_batch_size.max(1),
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.retention
    }

    /// Sweeps against the current clock.
    pub async fn sweep(&self) -> Result<SweepReport, SolarvitaError> {
        self.sweep_at(Utc::now()).await
    }

    /// Deletes every record created strictly before `now - retention`, for
    /// every user, in batches of at most `max_batch_size`.
    ///
    /// A user that fails is logged and skipped; the sweep still covers the
    /// remaining users and reports the failures at the end.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, SolarvitaError> {
        let cutoff = self.cutoff(now);
        let user_ids = self.notifications.user_ids().await.map_err(|err| {
            error!(error = %err, "Failed to list users for retention sweep");
            SolarvitaError::CleanupFailure(err.to_string())
        })?;

        let mut report = SweepReport {
            deleted: 0,
            users: user_ids.len(),
            failed_users: Vec::new(),
        };

        for user_id in user_ids {
            match self.sweep_user(&user_id, cutoff).await {
                Ok(deleted) => {
                    if deleted > 0 {
                        debug!(user_id = %user_id, deleted, "Swept old notifications");
                    }
                    report.deleted += deleted;
                }
                Err(err) => {
                    error!(user_id = %user_id, error = %err, "Retention sweep failed for user");
                    report.failed_users.push(user_id);
                }
            }
        }

        info!(
            deleted = report.deleted,
            users = report.users,
            failed = report.failed_users.len(),
            cutoff = %cutoff,
            "Retention sweep finished"
        );

        if report.is_success() {
            Ok(report)
        } else {
            Err(SolarvitaError::CleanupFailure(format!(
                "Retention sweep failed for {} of {} users ({} records deleted)",
                report.failed_users.len(),
                report.users,
                report.deleted
            )))
        }
    }

    async fn sweep_user(&self, user_id: &str, cutoff: DateTime<Utc>) -> Result<u64, SolarvitaError> {
        let mut deleted = 0;
        loop {
            let batch = self
                .notifications
                .delete_older_than(user_id, cutoff, self.max_batch_size)
                .await
                .map_err(|err| SolarvitaError::CleanupFailure(err.to_string()))?;
            deleted += batch;

            if batch < self.max_batch_size as u64 {
                return Ok(deleted);
            }
        }
    }
}
