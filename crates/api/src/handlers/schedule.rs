//! Handlers for the `/schedules` resource: listing and user-driven dose
//! transitions.

use axum::extract::{Path, Query, State};
use axum::Json;
use medtrack_core::error::CoreError;
use medtrack_core::types::DbId;
use medtrack_db::repositories::ScheduleRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Query parameters for `GET /schedules`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional status filter (`pending`, `sent`, `taken`, `missed`).
    pub status: Option<String>,
    /// Maximum number of entries. Defaults to 20, capped at 100.
    pub limit: Option<i64>,
}

/// Maximum page size for schedule listings.
const MAX_LIMIT: i64 = 100;

/// Default page size for schedule listings.
const DEFAULT_LIMIT: i64 = 20;

/// GET /api/v1/schedules
///
/// List the authenticated user's schedule entries across all medications,
/// most recent first.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let entries =
        ScheduleRepo::list_for_user(&state.pool, auth.user_id, params.status.as_deref(), limit)
            .await?;
    Ok(Json(serde_json::json!({ "data": entries })))
}

/// POST /api/v1/schedules/{id}/taken
///
/// Mark a dose as taken. 404 unless the dose belongs to the authenticated
/// user and is not already taken.
pub async fn mark_taken(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = ScheduleRepo::mark_taken(&state.pool, id, auth.user_id).await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Schedule",
            id,
        }));
    }
    Ok(Json(serde_json::json!({ "data": { "status": "taken" } })))
}

/// POST /api/v1/schedules/{id}/missed
///
/// Mark a dose as missed. Same ownership rules as marking taken.
pub async fn mark_missed(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = ScheduleRepo::mark_missed(&state.pool, id, auth.user_id).await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Schedule",
            id,
        }));
    }
    Ok(Json(serde_json::json!({ "data": { "status": "missed" } })))
}
