//! Future-schedule replenishment.
//!
//! Hourly, every active medication is topped up: when its count of future
//! pending doses drops below the low-water mark, a fresh horizon is computed
//! from the recurrence rule and the missing entries inserted. Insertion is
//! idempotent, so a cycle interrupted mid-batch is safe to re-run.

use std::time::Duration;

use chrono::Utc;
use medtrack_core::recurrence;
use medtrack_db::repositories::{MedicationRepo, ScheduleRepo};
use medtrack_db::DbPool;
use tokio_util::sync::CancellationToken;

/// How often replenishment runs.
const REPLENISH_INTERVAL: Duration = Duration::from_secs(3600);

/// Top up a medication when it has fewer future pending doses than this.
const LOW_WATER_MARK: i64 = 10;

/// Forward window for which dose instances are pre-generated.
pub const HORIZON_DAYS: i64 = 7;

/// Run the replenishment loop until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = REPLENISH_INTERVAL.as_secs(),
        low_water_mark = LOW_WATER_MARK,
        horizon_days = HORIZON_DAYS,
        "Schedule replenishment started"
    );

    let mut interval = tokio::time::interval(REPLENISH_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Schedule replenishment stopping");
                break;
            }
            _ = interval.tick() => {
                match replenish(&pool).await {
                    Ok(created) if created > 0 => {
                        tracing::info!(created, "Replenishment created new schedule entries");
                    }
                    Ok(_) => {
                        tracing::debug!("Replenishment: all medications topped up");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Replenishment cycle failed");
                    }
                }
            }
        }
    }
}

/// One replenishment cycle over all active medications. Returns the total
/// number of entries inserted.
async fn replenish(pool: &DbPool) -> Result<u64, sqlx::Error> {
    let medications = MedicationRepo::list_active_for_scheduling(pool).await?;
    let mut total_created = 0u64;

    for medication in &medications {
        let existing = ScheduleRepo::future_pending_count(pool, medication.id).await?;
        if existing >= LOW_WATER_MARK {
            continue;
        }

        let occurrences = match recurrence::next_occurrences(
            medication.start_time,
            medication.frequency_hours,
            Utc::now(),
            HORIZON_DAYS,
        ) {
            Ok(occurrences) => occurrences,
            Err(e) => {
                // The rule is range-checked on write, so this indicates a row
                // edited outside the API. Skip it rather than abort the cycle.
                tracing::error!(
                    medication_id = medication.id,
                    error = %e,
                    "Skipping medication with unusable recurrence rule"
                );
                continue;
            }
        };

        total_created += ScheduleRepo::insert_missing(pool, medication.id, &occurrences).await?;
    }

    Ok(total_created)
}
