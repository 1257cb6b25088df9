//! Medication entity model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use medtrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `medications` table.
///
/// `frequency_hours` and `start_time` together form the recurrence rule.
/// A NULL `duration_days` means a continuous treatment; `started_at` is
/// stamped the first time a duration is set and never cleared.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Medication {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub frequency_hours: f64,
    pub start_time: NaiveTime,
    pub duration_days: Option<i32>,
    pub started_at: Option<NaiveDate>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a medication. The recurrence rule has already been
/// validated by the caller (`start_time` parsed, frequency range-checked).
#[derive(Debug)]
pub struct CreateMedication {
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub frequency_hours: f64,
    pub start_time: NaiveTime,
    pub duration_days: Option<i32>,
    pub started_at: Option<NaiveDate>,
}

/// DTO for updating a medication. Only non-`None` fields are applied.
/// Carries validated types; request parsing happens at the API layer.
#[derive(Debug, Default)]
pub struct UpdateMedication {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub frequency_hours: Option<f64>,
    pub start_time: Option<NaiveTime>,
    pub duration_days: Option<i32>,
    pub started_at: Option<NaiveDate>,
    pub active: Option<bool>,
}
