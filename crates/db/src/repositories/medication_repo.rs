//! Repository for the `medications` table.

use medtrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::medication::{CreateMedication, Medication, UpdateMedication};

/// Column list for `medications` queries.
const COLUMNS: &str = "id, user_id, name, description, dosage, frequency_hours, \
                       start_time, duration_days, started_at, active, created_at, updated_at";

/// Provides CRUD operations for medications.
pub struct MedicationRepo;

impl MedicationRepo {
    /// Insert a new medication, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMedication) -> Result<Medication, sqlx::Error> {
        let query = format!(
            "INSERT INTO medications \
                 (user_id, name, description, dosage, frequency_hours, start_time, \
                  duration_days, started_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Medication>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.dosage)
            .bind(input.frequency_hours)
            .bind(input.start_time)
            .bind(input.duration_days)
            .bind(input.started_at)
            .fetch_one(pool)
            .await
    }

    /// Find a medication by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Medication>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM medications WHERE id = $1");
        sqlx::query_as::<_, Medication>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's medications, most recently created first.
    ///
    /// When `active_only` is `true`, paused medications are filtered out.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        active_only: bool,
    ) -> Result<Vec<Medication>, sqlx::Error> {
        let filter = if active_only { "AND active" } else { "" };
        let query = format!(
            "SELECT {COLUMNS} FROM medications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Medication>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List every active medication across all users, for schedule
    /// replenishment. Ordered by start_time so replenishment output is
    /// deterministic.
    pub async fn list_active_for_scheduling(pool: &PgPool) -> Result<Vec<Medication>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM medications \
             WHERE active \
             ORDER BY start_time ASC, id ASC"
        );
        sqlx::query_as::<_, Medication>(&query).fetch_all(pool).await
    }

    /// Update a medication. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMedication,
    ) -> Result<Option<Medication>, sqlx::Error> {
        let query = format!(
            "UPDATE medications SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                dosage = COALESCE($4, dosage),
                frequency_hours = COALESCE($5, frequency_hours),
                start_time = COALESCE($6, start_time),
                duration_days = COALESCE($7, duration_days),
                started_at = COALESCE($8, started_at),
                active = COALESCE($9, active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Medication>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.dosage)
            .bind(input.frequency_hours)
            .bind(input.start_time)
            .bind(input.duration_days)
            .bind(input.started_at)
            .bind(input.active)
            .fetch_optional(pool)
            .await
    }

    /// Flip a medication's active flag, returning the updated row.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        active: bool,
    ) -> Result<Option<Medication>, sqlx::Error> {
        let query = format!(
            "UPDATE medications SET active = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Medication>(&query)
            .bind(id)
            .bind(active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a medication (cascades to its schedules and logs).
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM medications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
