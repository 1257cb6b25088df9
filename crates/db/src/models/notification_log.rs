//! Notification log entity model (append-only audit trail).

use medtrack_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// The only delivery channel currently supported.
pub const CHANNEL_EMAIL: &str = "email";

/// Delivery attempt succeeded.
pub const OUTCOME_SENT: &str = "sent";
/// Delivery attempt failed; `message` carries the diagnostic.
pub const OUTCOME_FAILED: &str = "failed";

/// A row from the `notification_logs` table. Never mutated after insert;
/// purged after the retention window.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationLog {
    pub id: DbId,
    pub medication_id: DbId,
    pub schedule_id: DbId,
    pub channel: String,
    pub outcome: String,
    pub message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
