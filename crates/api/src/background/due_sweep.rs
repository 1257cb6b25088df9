//! Due-notification sweep.
//!
//! Every minute, finds pending doses inside a short tolerance window and
//! dispatches a reminder for each. Stale claims from a crashed dispatch are
//! returned to `pending` at the start of every sweep.

use std::time::Duration;

use medtrack_db::repositories::ScheduleRepo;
use medtrack_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::notifications::dispatcher::{self, DispatchOutcome};

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Doses scheduled within the next window are considered due.
const TOLERANCE_MINUTES: i64 = 2;

/// Claims older than this are assumed orphaned by a crash and released.
const STALE_CLAIM_MINUTES: i64 = 10;

/// Run the due-notification sweep loop until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        tolerance_minutes = TOLERANCE_MINUTES,
        "Due-notification sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Due-notification sweep stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = sweep(&pool).await {
                    tracing::error!(error = %e, "Due-notification sweep failed");
                }
            }
        }
    }
}

/// One sweep cycle: release stale claims, then dispatch every due dose.
///
/// A failed dispatch does not abort the cycle; remaining due doses are still
/// processed.
async fn sweep(pool: &DbPool) -> Result<(), sqlx::Error> {
    let stale = ScheduleRepo::release_stale_claims(pool, STALE_CLAIM_MINUTES).await?;
    if stale > 0 {
        tracing::warn!(stale, "Released stale dispatch claims");
    }

    let due = ScheduleRepo::find_due(pool, TOLERANCE_MINUTES).await?;
    if due.is_empty() {
        return Ok(());
    }

    tracing::info!(count = due.len(), "Processing due reminders");

    let mut sent = 0u32;
    let mut failed = 0u32;
    for dose in &due {
        match dispatcher::dispatch(pool, dose).await {
            Ok(DispatchOutcome::Sent) => sent += 1,
            Ok(DispatchOutcome::Failed) => failed += 1,
            Ok(DispatchOutcome::Suppressed | DispatchOutcome::AlreadyClaimed) => {}
            Err(e) => {
                tracing::error!(
                    schedule_id = dose.schedule_id,
                    error = %e,
                    "Dispatch aborted by store error"
                );
            }
        }
    }

    if sent > 0 || failed > 0 {
        tracing::info!(sent, failed, "Sweep cycle complete");
    }
    Ok(())
}
