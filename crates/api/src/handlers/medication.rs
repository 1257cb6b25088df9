//! Handlers for the `/medications` resource.
//!
//! Medication mutations are the only triggers for schedule generation: a
//! create seeds the initial horizon, and any change to the recurrence rule
//! discards future pending entries before regenerating them under the new
//! rule.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use medtrack_core::error::CoreError;
use medtrack_core::recurrence;
use medtrack_core::types::{DbId, Timestamp};
use medtrack_core::{adherence, progress};
use medtrack_db::models::medication::{CreateMedication, Medication, UpdateMedication};
use medtrack_db::repositories::{MedicationRepo, ScheduleRepo};
use serde::Deserialize;

use crate::background::replenish::HORIZON_DAYS;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / query types
// ---------------------------------------------------------------------------

/// Request body for `POST /medications`.
#[derive(Debug, Deserialize)]
pub struct CreateMedicationRequest {
    pub name: String,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub frequency_hours: f64,
    /// Time of day, `HH:MM`.
    pub start_time: String,
    pub duration_days: Option<i32>,
    /// Retroactive history: number of doses already taken before the
    /// medication was registered. Requires `last_taken_time`.
    pub doses_already_taken: Option<i32>,
    /// When the most recent of those doses was taken.
    pub last_taken_time: Option<Timestamp>,
}

/// Request body for `PUT /medications/{id}`. All fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMedicationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub frequency_hours: Option<f64>,
    pub start_time: Option<String>,
    pub duration_days: Option<i32>,
    pub active: Option<bool>,
}

/// Query parameters for `GET /medications`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// When `false`, paused medications are included. Defaults to `true`.
    pub active: Option<bool>,
}

/// Query parameters for `GET /medications/{id}/schedules`.
#[derive(Debug, Deserialize)]
pub struct SchedulesQuery {
    /// Maximum number of entries. Defaults to 10, capped at 100.
    pub limit: Option<i64>,
}

/// Query parameters for `GET /medications/stats`.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Trailing window in days. Defaults to 30.
    pub days: Option<i64>,
}

/// Maximum page size for schedule listings.
const MAX_LIMIT: i64 = 100;

/// Default page size for schedule listings.
const DEFAULT_LIMIT: i64 = 10;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_duration_days(duration_days: Option<i32>) -> AppResult<()> {
    if let Some(days) = duration_days {
        if !(1..=365).contains(&days) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "duration_days must be between 1 and 365, got {days}"
            ))));
        }
    }
    Ok(())
}

/// Fetch a medication and verify it belongs to the authenticated user.
async fn owned_medication(
    pool: &medtrack_db::DbPool,
    id: DbId,
    user_id: DbId,
) -> AppResult<Medication> {
    let medication = MedicationRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Medication",
            id,
        }))?;
    if medication.user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Medication belongs to another user".into(),
        )));
    }
    Ok(medication)
}

/// Serialize a medication with its derived progress and treatment status.
fn medication_json(medication: &Medication) -> serde_json::Value {
    let today = Utc::now().date_naive();
    let mut value = serde_json::to_value(medication).expect("medication serializes");
    let map = value.as_object_mut().expect("medication is a JSON object");
    map.insert(
        "progress".into(),
        serde_json::to_value(progress::progress(
            medication.duration_days,
            medication.started_at,
            today,
        ))
        .expect("progress serializes"),
    );
    map.insert(
        "treatment_status".into(),
        serde_json::to_value(progress::treatment_status(
            medication.duration_days,
            medication.started_at,
            today,
        ))
        .expect("status serializes"),
    );
    value
}

/// Generate and persist the forward horizon for a medication's current rule.
async fn generate_horizon(
    pool: &medtrack_db::DbPool,
    medication: &Medication,
) -> AppResult<u64> {
    let occurrences = recurrence::next_occurrences(
        medication.start_time,
        medication.frequency_hours,
        Utc::now(),
        HORIZON_DAYS,
    )?;
    Ok(ScheduleRepo::insert_missing(pool, medication.id, &occurrences).await?)
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/medications
///
/// List the authenticated user's medications with progress attached.
/// Shows only active medications unless `?active=false`.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let active_only = params.active.unwrap_or(true);
    let medications = MedicationRepo::list_for_user(&state.pool, auth.user_id, active_only).await?;

    let data: Vec<serde_json::Value> = medications.iter().map(medication_json).collect();
    Ok(Json(serde_json::json!({ "data": data })))
}

/// GET /api/v1/medications/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let medication = owned_medication(&state.pool, id, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "data": medication_json(&medication) })))
}

/// POST /api/v1/medications
///
/// Create a medication and seed its schedule. With `doses_already_taken` +
/// `last_taken_time`, the treatment is backfilled: historical doses are
/// recorded as taken and the forward chain continues from the last dose.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateMedicationRequest>,
) -> AppResult<impl IntoResponse> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Name must not be empty".into(),
        )));
    }
    let start_time = recurrence::parse_start_time(&body.start_time)?;
    recurrence::validate_frequency(body.frequency_hours)?;
    validate_duration_days(body.duration_days)?;

    let backfill = match (body.doses_already_taken, body.last_taken_time) {
        (Some(doses), Some(last_taken)) => Some(recurrence::backfill_plan(
            last_taken,
            doses,
            body.frequency_hours,
            Utc::now(),
            HORIZON_DAYS,
        )?),
        (None, None) => None,
        _ => {
            return Err(AppError::Core(CoreError::Validation(
                "doses_already_taken and last_taken_time must be provided together".into(),
            )))
        }
    };

    let medication = MedicationRepo::create(
        &state.pool,
        &CreateMedication {
            user_id: auth.user_id,
            name: name.to_string(),
            description: body.description.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            dosage: body.dosage.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            frequency_hours: body.frequency_hours,
            start_time,
            duration_days: body.duration_days,
            started_at: body.duration_days.map(|_| Utc::now().date_naive()),
        },
    )
    .await?;

    match backfill {
        Some(plan) => {
            ScheduleRepo::insert_taken(&state.pool, medication.id, &plan.taken).await?;
            ScheduleRepo::insert_missing(&state.pool, medication.id, &plan.pending).await?;
        }
        None => {
            generate_horizon(&state.pool, &medication).await?;
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": medication_json(&medication) })),
    ))
}

/// PUT /api/v1/medications/{id}
///
/// Update a medication. A change to `frequency_hours` or `start_time`
/// invalidates future pending doses and regenerates them under the new rule.
/// Setting `duration_days` for the first time stamps `started_at`.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<UpdateMedicationRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = owned_medication(&state.pool, id, auth.user_id).await?;

    let start_time = body
        .start_time
        .as_deref()
        .map(recurrence::parse_start_time)
        .transpose()?;
    if let Some(frequency) = body.frequency_hours {
        recurrence::validate_frequency(frequency)?;
    }
    validate_duration_days(body.duration_days)?;

    let rule_changed = body.frequency_hours.is_some() || start_time.is_some();
    let started_at = match (body.duration_days, existing.started_at) {
        (Some(_), None) => Some(Utc::now().date_naive()),
        _ => None,
    };

    let updated = MedicationRepo::update(
        &state.pool,
        id,
        &UpdateMedication {
            name: body.name.as_deref().map(str::trim).map(String::from),
            description: body.description,
            dosage: body.dosage,
            frequency_hours: body.frequency_hours,
            start_time,
            duration_days: body.duration_days,
            started_at,
            active: body.active,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Medication",
        id,
    }))?;

    if rule_changed {
        let discarded = ScheduleRepo::invalidate_future_pending(&state.pool, id).await?;
        let created = generate_horizon(&state.pool, &updated).await?;
        tracing::info!(
            medication_id = id,
            discarded,
            created,
            "Recurrence rule changed, schedule regenerated"
        );
    }

    Ok(Json(serde_json::json!({ "data": medication_json(&updated) })))
}

/// DELETE /api/v1/medications/{id}
///
/// Delete a medication; its schedules and logs cascade away with it.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    owned_medication(&state.pool, id, auth.user_id).await?;
    MedicationRepo::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/medications/{id}/toggle
///
/// Pause or resume a medication. Resuming regenerates the forward horizon
/// so reminders pick up immediately rather than waiting for replenishment.
pub async fn toggle(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let medication = owned_medication(&state.pool, id, auth.user_id).await?;

    let updated = MedicationRepo::set_active(&state.pool, id, !medication.active)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Medication",
            id,
        }))?;

    if updated.active {
        generate_horizon(&state.pool, &updated).await?;
    }

    Ok(Json(serde_json::json!({ "data": medication_json(&updated) })))
}

// ---------------------------------------------------------------------------
// Schedules and statistics
// ---------------------------------------------------------------------------

/// GET /api/v1/medications/{id}/schedules
///
/// List a medication's most recent schedule entries.
pub async fn schedules(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<SchedulesQuery>,
) -> AppResult<Json<serde_json::Value>> {
    owned_medication(&state.pool, id, auth.user_id).await?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let entries = ScheduleRepo::list_for_medication(&state.pool, id, limit).await?;
    Ok(Json(serde_json::json!({ "data": entries })))
}

/// GET /api/v1/medications/stats
///
/// Aggregate dose statistics and adherence rate for the authenticated user
/// over a trailing window.
pub async fn stats(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<StatsQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let days = params.days.unwrap_or(30).max(1);
    let stats = ScheduleRepo::user_stats(&state.pool, auth.user_id, days).await?;
    let adherence_rate = adherence::adherence_rate(stats.taken, stats.missed);

    Ok(Json(serde_json::json!({
        "data": {
            "total": stats.total,
            "taken": stats.taken,
            "missed": stats.missed,
            "sent": stats.sent,
            "pending": stats.pending,
            "adherence_rate": adherence_rate,
            "period": days,
        }
    })))
}
