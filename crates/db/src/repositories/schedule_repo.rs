//! Repository for the `medication_schedules` table -- the persisted queue of
//! dose instances.
//!
//! Insertion is idempotent on (medication_id, scheduled_time) via the table's
//! unique constraint, so schedule generation is safe to re-run with
//! overlapping timestamp sets. The claim/release pair implements the
//! conditional `pending -> sending` transition the dispatcher uses to keep
//! overlapping sweeps from double-sending a dose.

use medtrack_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::schedule::{
    DoseStats, DueDose, MedicationSchedule, ScheduleWithMedication,
};

/// Column list for `medication_schedules` queries.
const COLUMNS: &str =
    "id, medication_id, scheduled_time, status, taken_at, created_at, updated_at";

/// Provides operations on the dose schedule queue.
pub struct ScheduleRepo;

impl ScheduleRepo {
    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Insert pending entries for every timestamp not already present for
    /// this medication. Returns the number of rows actually inserted.
    pub async fn insert_missing(
        pool: &PgPool,
        medication_id: DbId,
        timestamps: &[Timestamp],
    ) -> Result<u64, sqlx::Error> {
        if timestamps.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO medication_schedules (medication_id, scheduled_time) \
             SELECT $1, t FROM UNNEST($2::timestamptz[]) AS t \
             ON CONFLICT (medication_id, scheduled_time) DO NOTHING",
        )
        .bind(medication_id)
        .bind(timestamps)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert historical backfill entries already marked `taken`, with
    /// `taken_at` equal to the scheduled time. Same conflict policy as
    /// [`Self::insert_missing`].
    pub async fn insert_taken(
        pool: &PgPool,
        medication_id: DbId,
        timestamps: &[Timestamp],
    ) -> Result<u64, sqlx::Error> {
        if timestamps.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO medication_schedules (medication_id, scheduled_time, status, taken_at) \
             SELECT $1, t, 'taken', t FROM UNNEST($2::timestamptz[]) AS t \
             ON CONFLICT (medication_id, scheduled_time) DO NOTHING",
        )
        .bind(medication_id)
        .bind(timestamps)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Due detection and claiming
    // -----------------------------------------------------------------------

    /// Find pending doses due within the next `tolerance_minutes`, joined
    /// with their medication (which must be active) and owning user, ordered
    /// by scheduled time.
    pub async fn find_due(
        pool: &PgPool,
        tolerance_minutes: i64,
    ) -> Result<Vec<DueDose>, sqlx::Error> {
        sqlx::query_as::<_, DueDose>(
            "SELECT \
                 ms.id AS schedule_id, \
                 ms.medication_id, \
                 ms.scheduled_time, \
                 m.name AS medication_name, \
                 m.description, \
                 m.dosage, \
                 m.frequency_hours, \
                 m.user_id, \
                 u.name AS user_name \
             FROM medication_schedules ms \
             JOIN medications m ON ms.medication_id = m.id \
             JOIN users u ON m.user_id = u.id \
             WHERE ms.status = 'pending' \
               AND ms.scheduled_time >= NOW() \
               AND ms.scheduled_time <= NOW() + ($1 * INTERVAL '1 minute') \
               AND m.active \
             ORDER BY ms.scheduled_time ASC",
        )
        .bind(tolerance_minutes)
        .fetch_all(pool)
        .await
    }

    /// Claim a pending dose for dispatch (`pending -> sending`).
    ///
    /// Returns `false` if the dose was not in `pending` state, i.e. another
    /// sweep already claimed or resolved it.
    pub async fn claim(pool: &PgPool, schedule_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE medication_schedules \
             SET status = 'sending' \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(schedule_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release a claimed dose back to `pending` so a later sweep retries it.
    pub async fn release(pool: &PgPool, schedule_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE medication_schedules \
             SET status = 'pending' \
             WHERE id = $1 AND status = 'sending'",
        )
        .bind(schedule_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Return doses stuck in `sending` (a crash mid-dispatch orphans the
    /// claim) to `pending`. Returns the number of rows released.
    pub async fn release_stale_claims(
        pool: &PgPool,
        older_than_minutes: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE medication_schedules \
             SET status = 'pending' \
             WHERE status = 'sending' \
               AND updated_at < NOW() - ($1 * INTERVAL '1 minute')",
        )
        .bind(older_than_minutes)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Mark a dose as sent (delivered or deliberately suppressed).
    pub async fn mark_sent(pool: &PgPool, schedule_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE medication_schedules \
             SET status = 'sent' \
             WHERE id = $1 AND status IN ('pending', 'sending')",
        )
        .bind(schedule_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a dose as taken, stamping `taken_at`.
    ///
    /// Ownership-checked: returns `false` unless the dose belongs to a
    /// medication owned by `user_id` and is not already taken.
    pub async fn mark_taken(
        pool: &PgPool,
        schedule_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE medication_schedules ms \
             SET status = 'taken', taken_at = NOW() \
             FROM medications m \
             WHERE ms.id = $1 \
               AND ms.medication_id = m.id \
               AND m.user_id = $2 \
               AND ms.status <> 'taken'",
        )
        .bind(schedule_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a dose as missed. Ownership-checked like [`Self::mark_taken`].
    pub async fn mark_missed(
        pool: &PgPool,
        schedule_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE medication_schedules ms \
             SET status = 'missed', taken_at = NULL \
             FROM medications m \
             WHERE ms.id = $1 \
               AND ms.medication_id = m.id \
               AND m.user_id = $2 \
               AND ms.status <> 'missed'",
        )
        .bind(schedule_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Invalidation and retention
    // -----------------------------------------------------------------------

    /// Delete future pending entries for a medication. Used when the
    /// recurrence rule changes, so timestamps computed under the old rule are
    /// discarded before regeneration. Returns the number of rows deleted.
    pub async fn invalidate_future_pending(
        pool: &PgPool,
        medication_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM medication_schedules \
             WHERE medication_id = $1 \
               AND status = 'pending' \
               AND scheduled_time > NOW()",
        )
        .bind(medication_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete terminal-status entries older than `max_age_days`. Pending
    /// entries are retained regardless of age. Returns rows deleted.
    pub async fn cleanup_old(pool: &PgPool, max_age_days: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM medication_schedules \
             WHERE scheduled_time < NOW() - ($1 * INTERVAL '1 day') \
               AND status IN ('sent', 'taken', 'missed')",
        )
        .bind(max_age_days)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Find a schedule entry by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MedicationSchedule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM medication_schedules WHERE id = $1");
        sqlx::query_as::<_, MedicationSchedule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count a medication's future pending entries (replenishment low-water
    /// check).
    pub async fn future_pending_count(
        pool: &PgPool,
        medication_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM medication_schedules \
             WHERE medication_id = $1 \
               AND status = 'pending' \
               AND scheduled_time > NOW()",
        )
        .bind(medication_id)
        .fetch_one(pool)
        .await
    }

    /// List a medication's schedule entries, most recent first.
    pub async fn list_for_medication(
        pool: &PgPool,
        medication_id: DbId,
        limit: i64,
    ) -> Result<Vec<MedicationSchedule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM medication_schedules \
             WHERE medication_id = $1 \
             ORDER BY scheduled_time DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, MedicationSchedule>(&query)
            .bind(medication_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// List a user's schedule entries across all medications, most recent
    /// first, optionally filtered by status.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ScheduleWithMedication>, sqlx::Error> {
        let filter = if status.is_some() {
            "AND ms.status = $3"
        } else {
            ""
        };
        let query = format!(
            "SELECT \
                 ms.id, ms.medication_id, ms.scheduled_time, ms.status, ms.taken_at, \
                 m.name AS medication_name, m.dosage \
             FROM medication_schedules ms \
             JOIN medications m ON ms.medication_id = m.id \
             WHERE m.user_id = $1 {filter} \
             ORDER BY ms.scheduled_time DESC \
             LIMIT $2"
        );
        let mut q = sqlx::query_as::<_, ScheduleWithMedication>(&query)
            .bind(user_id)
            .bind(limit);
        if let Some(status) = status {
            q = q.bind(status);
        }
        q.fetch_all(pool).await
    }

    /// Aggregate dose counts for a user over the trailing `window_days`.
    pub async fn user_stats(
        pool: &PgPool,
        user_id: DbId,
        window_days: i64,
    ) -> Result<DoseStats, sqlx::Error> {
        sqlx::query_as::<_, DoseStats>(
            "SELECT \
                 COUNT(*) AS total, \
                 COUNT(*) FILTER (WHERE ms.status = 'taken') AS taken, \
                 COUNT(*) FILTER (WHERE ms.status = 'missed') AS missed, \
                 COUNT(*) FILTER (WHERE ms.status = 'sent') AS sent, \
                 COUNT(*) FILTER (WHERE ms.status IN ('pending', 'sending')) AS pending \
             FROM medication_schedules ms \
             JOIN medications m ON ms.medication_id = m.id \
             WHERE m.user_id = $1 \
               AND ms.scheduled_time >= NOW() - ($2 * INTERVAL '1 day')",
        )
        .bind(user_id)
        .bind(window_days)
        .fetch_one(pool)
        .await
    }
}
