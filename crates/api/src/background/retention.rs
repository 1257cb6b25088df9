//! Daily retention cleanup.
//!
//! Purges terminal-status schedule entries and old notification logs past
//! their retention windows. Pending doses are never purged regardless of age.

use std::time::Duration;

use medtrack_db::repositories::{NotificationLogRepo, ScheduleRepo};
use medtrack_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Default retention for terminal schedule entries, in days.
const DEFAULT_SCHEDULE_RETENTION_DAYS: i64 = 30;

/// Default retention for notification logs, in days.
const DEFAULT_LOG_RETENTION_DAYS: i64 = 90;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(86_400); // daily

/// Run the retention cleanup loop.
///
/// Retention windows default to 30 days (schedules) and 90 days (logs) and
/// can be overridden with `SCHEDULE_RETENTION_DAYS` / `LOG_RETENTION_DAYS`.
/// Runs until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    let schedule_retention_days: i64 = std::env::var("SCHEDULE_RETENTION_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SCHEDULE_RETENTION_DAYS);
    let log_retention_days: i64 = std::env::var("LOG_RETENTION_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_LOG_RETENTION_DAYS);

    tracing::info!(
        schedule_retention_days,
        log_retention_days,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Retention cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Retention cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match ScheduleRepo::cleanup_old(&pool, schedule_retention_days).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Retention: purged old schedule entries");
                    }
                    Ok(_) => {
                        tracing::debug!("Retention: no schedule entries to purge");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Retention: schedule cleanup failed");
                    }
                }

                match NotificationLogRepo::cleanup_old(&pool, log_retention_days).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Retention: purged old notification logs");
                    }
                    Ok(_) => {
                        tracing::debug!("Retention: no notification logs to purge");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Retention: log cleanup failed");
                    }
                }
            }
        }
    }
}
