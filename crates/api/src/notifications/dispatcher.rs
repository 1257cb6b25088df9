//! Dispatch flow for one due dose.
//!
//! Each due dose is claimed (`pending -> sending`) before any work happens,
//! so overlapping sweep invocations cannot double-send. Users with no usable
//! notification configuration get their dose marked `sent` without a
//! delivery attempt -- a deliberate don't-retry-forever policy. Transport
//! failures are logged and the claim released, making delivery at-least-once:
//! the next sweep retries once the transport recovers.

use medtrack_db::models::notification_log::{CHANNEL_EMAIL, OUTCOME_FAILED, OUTCOME_SENT};
use medtrack_db::models::schedule::DueDose;
use medtrack_db::repositories::{NotificationLogRepo, NotificationSettingsRepo, ScheduleRepo};
use medtrack_db::DbPool;

use super::email::{self, ReminderPayload, SmtpConfig};

/// What happened to one due dose during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Reminder delivered; dose marked `sent` and logged.
    Sent,
    /// No usable configuration; dose marked `sent` without a delivery attempt.
    Suppressed,
    /// Transport failure; logged, claim released for retry on a later sweep.
    Failed,
    /// Another sweep claimed the dose first; nothing to do.
    AlreadyClaimed,
}

/// Dispatch a single due dose: claim, resolve configuration, deliver,
/// transition, log.
///
/// Store-level errors propagate; delivery failures do not.
pub async fn dispatch(pool: &DbPool, due: &DueDose) -> Result<DispatchOutcome, sqlx::Error> {
    if !ScheduleRepo::claim(pool, due.schedule_id).await? {
        tracing::debug!(schedule_id = due.schedule_id, "Dose already claimed, skipping");
        return Ok(DispatchOutcome::AlreadyClaimed);
    }

    let settings = NotificationSettingsRepo::find_by_user(pool, due.user_id).await?;

    let config = settings.as_ref().and_then(|s| {
        if s.is_fully_configured() {
            SmtpConfig::from_settings(s).map(|c| (c, s.gateway_email.clone().unwrap_or_default()))
        } else {
            None
        }
    });

    let Some((smtp, gateway_email)) = config else {
        // Missing, disabled, or incomplete configuration: suppress instead of
        // retrying a dose that can never be delivered.
        tracing::debug!(
            user_id = due.user_id,
            schedule_id = due.schedule_id,
            "Notification configuration unusable, suppressing reminder"
        );
        ScheduleRepo::mark_sent(pool, due.schedule_id).await?;
        return Ok(DispatchOutcome::Suppressed);
    };

    let payload = ReminderPayload {
        medication_name: due.medication_name.clone(),
        dosage: due.dosage.clone(),
        description: due.description.clone(),
        frequency_hours: due.frequency_hours,
        user_name: due.user_name.clone(),
    };

    match email::send_reminder(&smtp, &gateway_email, &payload).await {
        Ok(()) => {
            ScheduleRepo::mark_sent(pool, due.schedule_id).await?;
            NotificationLogRepo::append(
                pool,
                due.medication_id,
                due.schedule_id,
                CHANNEL_EMAIL,
                OUTCOME_SENT,
                Some("Reminder email delivered"),
            )
            .await?;
            tracing::info!(
                schedule_id = due.schedule_id,
                medication = %due.medication_name,
                "Reminder dispatched"
            );
            Ok(DispatchOutcome::Sent)
        }
        Err(err) => {
            let diagnostic = err.to_string();
            tracing::warn!(
                schedule_id = due.schedule_id,
                medication = %due.medication_name,
                error = %diagnostic,
                "Reminder delivery failed"
            );
            NotificationLogRepo::append(
                pool,
                due.medication_id,
                due.schedule_id,
                CHANNEL_EMAIL,
                OUTCOME_FAILED,
                Some(&diagnostic),
            )
            .await?;
            ScheduleRepo::release(pool, due.schedule_id).await?;
            Ok(DispatchOutcome::Failed)
        }
    }
}
