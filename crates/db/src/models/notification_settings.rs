//! Per-user notification configuration model and DTOs.

use medtrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_notification_settings` table (1:1 per user,
/// created lazily with defaults on first access).
///
/// Contains SMTP credentials -- use [`NotificationSettingsResponse`] for
/// API output.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationSettings {
    pub id: DbId,
    pub user_id: DbId,
    pub gateway_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_secure: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub notifications_enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationSettings {
    /// SMTP credentials are complete enough to open a transport.
    pub fn has_smtp_config(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|h| !h.is_empty())
            && self.smtp_port.is_some()
            && self.smtp_username.as_deref().is_some_and(|u| !u.is_empty())
            && self.smtp_password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// A push-gateway destination address is configured.
    pub fn has_gateway_email(&self) -> bool {
        self.gateway_email
            .as_deref()
            .is_some_and(|e| !e.trim().is_empty())
    }

    /// Reminders can actually be delivered for this user.
    pub fn is_fully_configured(&self) -> bool {
        self.notifications_enabled && self.has_gateway_email() && self.has_smtp_config()
    }
}

/// Safe settings representation for API responses: the SMTP password is
/// replaced with a mask when set, never echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationSettingsResponse {
    pub id: DbId,
    pub user_id: DbId,
    pub gateway_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_secure: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub notifications_enabled: bool,
    pub updated_at: Timestamp,
}

impl From<NotificationSettings> for NotificationSettingsResponse {
    fn from(s: NotificationSettings) -> Self {
        let masked = s.smtp_password.as_deref().map(|_| "***".to_string());
        Self {
            id: s.id,
            user_id: s.user_id,
            gateway_email: s.gateway_email,
            smtp_host: s.smtp_host,
            smtp_port: s.smtp_port,
            smtp_secure: s.smtp_secure,
            smtp_username: s.smtp_username,
            smtp_password: masked,
            notifications_enabled: s.notifications_enabled,
            updated_at: s.updated_at,
        }
    }
}

/// DTO for partially updating settings. Only non-`None` fields are applied.
#[derive(Debug, Default)]
pub struct UpdateNotificationSettings {
    pub gateway_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_secure: Option<bool>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub notifications_enabled: Option<bool>,
}
