//! Repository for the `user_notification_settings` table.

use medtrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification_settings::{NotificationSettings, UpdateNotificationSettings};

/// Column list for `user_notification_settings` queries.
const COLUMNS: &str = "id, user_id, gateway_email, smtp_host, smtp_port, smtp_secure, \
                       smtp_username, smtp_password, notifications_enabled, \
                       created_at, updated_at";

/// Provides access to per-user notification configuration.
pub struct NotificationSettingsRepo;

impl NotificationSettingsRepo {
    /// Find the settings row for a user.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<NotificationSettings>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_notification_settings WHERE user_id = $1");
        sqlx::query_as::<_, NotificationSettings>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a user's settings, creating the default row on first access.
    ///
    /// The insert ignores the unique-constraint conflict so two concurrent
    /// first accesses both end up reading the same row.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<NotificationSettings, sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_notification_settings (user_id) \
             VALUES ($1) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM user_notification_settings WHERE user_id = $1");
        sqlx::query_as::<_, NotificationSettings>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Update a user's settings. Only non-`None` fields are applied; the row
    /// is created with defaults first if it does not exist yet.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        input: &UpdateNotificationSettings,
    ) -> Result<NotificationSettings, sqlx::Error> {
        // Ensure the row exists so a partial update on first contact works.
        Self::get_or_create(pool, user_id).await?;

        let query = format!(
            "UPDATE user_notification_settings SET
                gateway_email = COALESCE($2, gateway_email),
                smtp_host = COALESCE($3, smtp_host),
                smtp_port = COALESCE($4, smtp_port),
                smtp_secure = COALESCE($5, smtp_secure),
                smtp_username = COALESCE($6, smtp_username),
                smtp_password = COALESCE($7, smtp_password),
                notifications_enabled = COALESCE($8, notifications_enabled)
             WHERE user_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationSettings>(&query)
            .bind(user_id)
            .bind(&input.gateway_email)
            .bind(&input.smtp_host)
            .bind(input.smtp_port)
            .bind(input.smtp_secure)
            .bind(&input.smtp_username)
            .bind(&input.smtp_password)
            .bind(input.notifications_enabled)
            .fetch_one(pool)
            .await
    }
}
