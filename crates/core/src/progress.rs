//! Treatment progress for fixed-duration medications.
//!
//! A medication with `duration_days` set is a fixed-length treatment; one
//! without is continuous and has no progress concept. Date arithmetic is
//! calendar-day granular (`NaiveDate`) so time-of-day components cannot
//! introduce off-by-one drift.

use chrono::NaiveDate;
use serde::Serialize;

/// Derived progress view over a fixed-duration treatment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TreatmentProgress {
    /// Whole days elapsed since the treatment started, clamped to >= 0.
    pub days_passed: i64,
    /// Whole days left, 0 once the duration has elapsed.
    pub days_remaining: i64,
    /// Percent complete, clamped to 0-100.
    pub progress_percentage: f64,
    pub is_completed: bool,
    pub is_active: bool,
}

/// Lifecycle status of a treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    /// No duration set; the medication is taken indefinitely.
    Continuous,
    /// Start date lies in the future.
    NotStarted,
    Active,
    Completed,
}

/// Compute progress for a treatment, or `None` for continuous medications.
///
/// `started_at` is stamped when `duration_days` is first set; if it is
/// somehow absent the treatment is counted as starting today.
pub fn progress(
    duration_days: Option<i32>,
    started_at: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<TreatmentProgress> {
    let duration = i64::from(duration_days?);
    let started = started_at.unwrap_or(today);

    let raw_days = (today - started).num_days();
    let days_passed = raw_days.max(0);

    Some(TreatmentProgress {
        days_passed,
        days_remaining: (duration - days_passed).max(0),
        progress_percentage: (days_passed as f64 / duration as f64 * 100.0).clamp(0.0, 100.0),
        is_completed: days_passed >= duration,
        is_active: raw_days >= 0 && raw_days < duration,
    })
}

/// Derive the lifecycle status of a treatment.
pub fn treatment_status(
    duration_days: Option<i32>,
    started_at: Option<NaiveDate>,
    today: NaiveDate,
) -> TreatmentStatus {
    match progress(duration_days, started_at, today) {
        None => TreatmentStatus::Continuous,
        Some(p) if p.is_completed => TreatmentStatus::Completed,
        Some(p) if p.is_active => TreatmentStatus::Active,
        Some(_) => TreatmentStatus::NotStarted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn continuous_treatment_has_no_progress() {
        assert_eq!(progress(None, None, date(2026, 3, 10)), None);
        assert_eq!(
            treatment_status(None, None, date(2026, 3, 10)),
            TreatmentStatus::Continuous
        );
    }

    #[test]
    fn halfway_through_ten_day_treatment() {
        let p = progress(Some(10), Some(date(2026, 3, 5)), date(2026, 3, 10)).unwrap();
        assert_eq!(p.days_passed, 5);
        assert_eq!(p.days_remaining, 5);
        assert_eq!(p.progress_percentage, 50.0);
        assert!(p.is_active);
        assert!(!p.is_completed);
    }

    #[test]
    fn starts_today() {
        let p = progress(Some(10), Some(date(2026, 3, 10)), date(2026, 3, 10)).unwrap();
        assert_eq!(p.days_passed, 0);
        assert_eq!(p.days_remaining, 10);
        assert_eq!(p.progress_percentage, 0.0);
        assert!(p.is_active);
    }

    #[test]
    fn completed_exactly_at_duration() {
        let p = progress(Some(10), Some(date(2026, 3, 1)), date(2026, 3, 11)).unwrap();
        assert!(p.is_completed);
        assert!(!p.is_active);
        assert_eq!(p.days_remaining, 0);
        assert_eq!(p.progress_percentage, 100.0);
    }

    #[test]
    fn percentage_clamped_when_overshooting() {
        let p = progress(Some(10), Some(date(2026, 1, 1)), date(2026, 3, 10)).unwrap();
        assert!(p.days_passed > 10);
        assert!(p.is_completed);
        assert_eq!(p.progress_percentage, 100.0);
        assert_eq!(p.days_remaining, 0);
    }

    #[test]
    fn future_start_is_not_started() {
        let p = progress(Some(10), Some(date(2026, 3, 15)), date(2026, 3, 10)).unwrap();
        assert_eq!(p.days_passed, 0);
        assert!(!p.is_active);
        assert!(!p.is_completed);
        assert_eq!(
            treatment_status(Some(10), Some(date(2026, 3, 15)), date(2026, 3, 10)),
            TreatmentStatus::NotStarted
        );
    }

    #[test]
    fn status_active_and_completed() {
        assert_eq!(
            treatment_status(Some(10), Some(date(2026, 3, 5)), date(2026, 3, 10)),
            TreatmentStatus::Active
        );
        assert_eq!(
            treatment_status(Some(10), Some(date(2026, 2, 1)), date(2026, 3, 10)),
            TreatmentStatus::Completed
        );
    }

    #[test]
    fn missing_start_date_counts_from_today() {
        let p = progress(Some(10), None, date(2026, 3, 10)).unwrap();
        assert_eq!(p.days_passed, 0);
        assert!(p.is_active);
    }
}
