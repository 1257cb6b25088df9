//! Dose schedule entry models and DTOs.
//!
//! Each row is one concrete scheduled occurrence of a medication dose with
//! its own lifecycle state.

use medtrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Dose awaiting its scheduled time.
pub const STATUS_PENDING: &str = "pending";
/// Transient claim state held while a notification is in flight.
pub const STATUS_SENDING: &str = "sending";
/// Reminder delivered (or deliberately suppressed). Terminal.
pub const STATUS_SENT: &str = "sent";
/// Dose confirmed taken by the user. Terminal.
pub const STATUS_TAKEN: &str = "taken";
/// Dose reported missed. Terminal.
pub const STATUS_MISSED: &str = "missed";

/// A row from the `medication_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MedicationSchedule {
    pub id: DbId,
    pub medication_id: DbId,
    pub scheduled_time: Timestamp,
    pub status: String,
    pub taken_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A schedule row joined with its medication, for user-facing listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleWithMedication {
    pub id: DbId,
    pub medication_id: DbId,
    pub scheduled_time: Timestamp,
    pub status: String,
    pub taken_at: Option<Timestamp>,
    pub medication_name: String,
    pub dosage: Option<String>,
}

/// A due pending dose joined with its medication and owning user, as
/// returned by the due-sweep query. Everything the dispatcher needs to
/// render and deliver one reminder.
#[derive(Debug, Clone, FromRow)]
pub struct DueDose {
    pub schedule_id: DbId,
    pub medication_id: DbId,
    pub scheduled_time: Timestamp,
    pub medication_name: String,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub frequency_hours: f64,
    pub user_id: DbId,
    pub user_name: String,
}

/// Aggregate dose counts for a user over a trailing window.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct DoseStats {
    pub total: i64,
    pub taken: i64,
    pub missed: i64,
    pub sent: i64,
    pub pending: i64,
}
