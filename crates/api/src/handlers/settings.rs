//! Handlers for the `/settings` resource: notification configuration,
//! SMTP testing, and configuration status.

use axum::extract::State;
use axum::Json;
use medtrack_core::error::CoreError;
use medtrack_db::models::notification_settings::{
    NotificationSettingsResponse, UpdateNotificationSettings,
};
use medtrack_db::repositories::{NotificationSettingsRepo, UserRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::notifications::email::{self, SmtpConfig};
use crate::state::AppState;

/// Request body for `PUT /settings`. All fields optional; only provided
/// fields are applied.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub gateway_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_secure: Option<bool>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub notifications_enabled: Option<bool>,
}

fn validate_address(label: &str, value: &str) -> AppResult<()> {
    value
        .parse::<lettre::Address>()
        .map(|_| ())
        .map_err(|_| AppError::Core(CoreError::Validation(format!("Invalid {label}: {value}"))))
}

/// GET /api/v1/settings
///
/// Return the user's notification settings, creating defaults on first
/// access. The SMTP password is masked.
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let settings = NotificationSettingsRepo::get_or_create(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({
        "data": NotificationSettingsResponse::from(settings)
    })))
}

/// PUT /api/v1/settings
///
/// Partially update notification settings. Addresses are validated, the
/// SMTP port is range-checked, and the password is never echoed back.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if let Some(gateway_email) = body.gateway_email.as_deref().map(str::trim) {
        if !gateway_email.is_empty() {
            validate_address("gateway email", gateway_email)?;
        }
    }
    if let Some(smtp_username) = body.smtp_username.as_deref().map(str::trim) {
        if !smtp_username.is_empty() {
            validate_address("SMTP username", smtp_username)?;
        }
    }
    if let Some(port) = body.smtp_port {
        if !(1..=65535).contains(&port) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "SMTP port must be between 1 and 65535, got {port}"
            ))));
        }
    }

    let trimmed = |value: Option<String>| {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let settings = NotificationSettingsRepo::update(
        &state.pool,
        auth.user_id,
        &UpdateNotificationSettings {
            gateway_email: trimmed(body.gateway_email),
            smtp_host: trimmed(body.smtp_host),
            smtp_port: body.smtp_port,
            smtp_secure: body.smtp_secure,
            smtp_username: trimmed(body.smtp_username),
            smtp_password: trimmed(body.smtp_password),
            notifications_enabled: body.notifications_enabled,
        },
    )
    .await?;

    Ok(Json(serde_json::json!({
        "data": NotificationSettingsResponse::from(settings)
    })))
}

/// POST /api/v1/settings/test
///
/// Verify SMTP connectivity and send a test email to the gateway address.
/// Delivery problems come back as a 400 with the transport diagnostic.
pub async fn test(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let settings = NotificationSettingsRepo::find_by_user(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Notification settings not configured".into(),
            ))
        })?;

    let Some(config) = SmtpConfig::from_settings(&settings) else {
        return Err(AppError::Core(CoreError::Validation(
            "SMTP configuration is incomplete".into(),
        )));
    };
    if !settings.has_gateway_email() {
        return Err(AppError::Core(CoreError::Validation(
            "Gateway email address is not configured".into(),
        )));
    }
    let gateway_email = settings.gateway_email.clone().unwrap_or_default();

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    email::send_test(&config, &gateway_email, &user.name)
        .await
        .map_err(|e| AppError::BadRequest(format!("Test email failed: {e}")))?;

    Ok(Json(serde_json::json!({
        "data": { "message": "Test email sent" }
    })))
}

/// GET /api/v1/settings/status
///
/// Report configuration completeness without exposing any credentials.
pub async fn status(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let settings = NotificationSettingsRepo::find_by_user(&state.pool, auth.user_id).await?;

    let (has_gateway_email, has_smtp_config, notifications_enabled, is_fully_configured) =
        match &settings {
            Some(s) => (
                s.has_gateway_email(),
                s.has_smtp_config(),
                s.notifications_enabled,
                s.is_fully_configured(),
            ),
            None => (false, false, false, false),
        };

    Ok(Json(serde_json::json!({
        "data": {
            "has_settings": settings.is_some(),
            "has_gateway_email": has_gateway_email,
            "has_smtp_config": has_smtp_config,
            "notifications_enabled": notifications_enabled,
            "is_fully_configured": is_fully_configured,
        }
    })))
}
