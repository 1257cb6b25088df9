//! Repository for the `notification_logs` table (append-only).

use medtrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification_log::NotificationLog;

/// Provides append and retention operations for notification logs.
pub struct NotificationLogRepo;

impl NotificationLogRepo {
    /// Append one delivery-attempt record, returning the generated ID.
    pub async fn append(
        pool: &PgPool,
        medication_id: DbId,
        schedule_id: DbId,
        channel: &str,
        outcome: &str,
        message: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_logs (medication_id, schedule_id, channel, outcome, message) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(medication_id)
        .bind(schedule_id)
        .bind(channel)
        .bind(outcome)
        .bind(message)
        .fetch_one(pool)
        .await
    }

    /// List a user's most recent delivery attempts.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<NotificationLog>, sqlx::Error> {
        sqlx::query_as::<_, NotificationLog>(
            "SELECT nl.id, nl.medication_id, nl.schedule_id, nl.channel, nl.outcome, \
                    nl.message, nl.created_at, nl.updated_at \
             FROM notification_logs nl \
             JOIN medications m ON nl.medication_id = m.id \
             WHERE m.user_id = $1 \
             ORDER BY nl.created_at DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Delete log rows older than `max_age_days`. Returns rows deleted.
    pub async fn cleanup_old(pool: &PgPool, max_age_days: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM notification_logs \
             WHERE created_at < NOW() - ($1 * INTERVAL '1 day')",
        )
        .bind(max_age_days)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
