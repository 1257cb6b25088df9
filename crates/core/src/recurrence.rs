//! Recurrence calculator for medication dosing schedules.
//!
//! A recurrence rule is the pair (time-of-day, frequency-in-hours). This
//! module turns a rule into concrete future dose timestamps and computes
//! retroactive backfill plans for treatments reported as already started.
//! Both paths share the same frequency-to-interval conversion so forward
//! generation and backfill can never drift apart.
//!
//! Everything is a pure function of its inputs; `now` is always passed in
//! explicitly so sequences are restartable and testable.

use chrono::{Duration, NaiveTime};

use crate::types::Timestamp;

/// Minimum dosing frequency: every 30 minutes.
pub const MIN_FREQUENCY_HOURS: f64 = 0.5;

/// Maximum dosing frequency: once a year.
pub const MAX_FREQUENCY_HOURS: f64 = 8760.0;

/// Backfill may not reach further back than one year.
const MAX_BACKFILL_AGE_DAYS: i64 = 365;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Validation errors for recurrence rules and backfill requests.
///
/// Both variants are caller errors: malformed input is rejected at this
/// boundary, never silently corrected.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Malformed time-of-day or out-of-range frequency.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Backfill request with an unusable last-taken time or dose count.
    #[error("Invalid backfill: {0}")]
    InvalidBackfill(String),
}

// ---------------------------------------------------------------------------
// Rule validation
// ---------------------------------------------------------------------------

/// Parse an `HH:MM` time-of-day string.
///
/// Rejects anything unparseable or outside 00:00-23:59 with
/// [`ScheduleError::InvalidSchedule`].
pub fn parse_start_time(input: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M").map_err(|_| {
        ScheduleError::InvalidSchedule(format!("start_time must be HH:MM, got {input:?}"))
    })
}

/// Validate that a dosing frequency lies within the supported range.
pub fn validate_frequency(frequency_hours: f64) -> Result<(), ScheduleError> {
    // NaN fails the range check and is rejected along with everything else.
    if !(MIN_FREQUENCY_HOURS..=MAX_FREQUENCY_HOURS).contains(&frequency_hours) {
        return Err(ScheduleError::InvalidSchedule(format!(
            "frequency_hours must be between {MIN_FREQUENCY_HOURS} and {MAX_FREQUENCY_HOURS}, \
             got {frequency_hours}"
        )));
    }
    Ok(())
}

/// Convert a fractional frequency in hours to an exact step interval.
///
/// Millisecond resolution so fractional frequencies (e.g. 1.5h) compound
/// without rounding drift over the horizon.
fn dose_interval(frequency_hours: f64) -> Duration {
    Duration::milliseconds((frequency_hours * 3_600_000.0).round() as i64)
}

// ---------------------------------------------------------------------------
// Forward generation
// ---------------------------------------------------------------------------

/// Compute the future dose timestamps for a recurrence rule.
///
/// The sequence is strictly increasing, starts at today's `start_time`
/// (rolled to tomorrow if that moment has already passed), steps by exactly
/// `frequency_hours`, and is bounded by `now + horizon_days`.
pub fn next_occurrences(
    start_time: NaiveTime,
    frequency_hours: f64,
    now: Timestamp,
    horizon_days: i64,
) -> Result<Vec<Timestamp>, ScheduleError> {
    validate_frequency(frequency_hours)?;

    let step = dose_interval(frequency_hours);
    let end = now + Duration::days(horizon_days);

    let mut next = now.date_naive().and_time(start_time).and_utc();
    if next <= now {
        next += Duration::days(1);
    }

    let mut occurrences = Vec::new();
    while next <= end {
        occurrences.push(next);
        next += step;
    }

    Ok(occurrences)
}

// ---------------------------------------------------------------------------
// Backfill
// ---------------------------------------------------------------------------

/// Schedule entries to persist for a treatment reported as already started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillPlan {
    /// Historical doses, oldest first, ending exactly at the last-taken time.
    /// All are recorded with status `taken`.
    pub taken: Vec<Timestamp>,
    /// Forward doses continuing the chain from `last_taken + frequency`,
    /// bounded by the horizon. All are recorded `pending`.
    pub pending: Vec<Timestamp>,
}

/// Compute the backfill plan for a treatment with `doses_already_taken` doses
/// behind it, the most recent at `last_taken`.
///
/// `last_taken` must not be in the future nor more than a year old, and the
/// dose count must be at least 1; violations fail with
/// [`ScheduleError::InvalidBackfill`].
pub fn backfill_plan(
    last_taken: Timestamp,
    doses_already_taken: i32,
    frequency_hours: f64,
    now: Timestamp,
    horizon_days: i64,
) -> Result<BackfillPlan, ScheduleError> {
    validate_frequency(frequency_hours)?;

    if doses_already_taken < 1 {
        return Err(ScheduleError::InvalidBackfill(format!(
            "doses_already_taken must be at least 1, got {doses_already_taken}"
        )));
    }
    if last_taken > now {
        return Err(ScheduleError::InvalidBackfill(
            "last_taken_time must not be in the future".into(),
        ));
    }
    if last_taken < now - Duration::days(MAX_BACKFILL_AGE_DAYS) {
        return Err(ScheduleError::InvalidBackfill(format!(
            "last_taken_time must not be older than {MAX_BACKFILL_AGE_DAYS} days"
        )));
    }

    let step = dose_interval(frequency_hours);
    let end = now + Duration::days(horizon_days);

    // Historical chain ending exactly at last_taken, oldest first.
    let taken = (0..doses_already_taken as i64)
        .rev()
        .map(|n| last_taken - step * n as i32)
        .collect();

    // Forward chain continues from the same anchor so spacing stays exact.
    let mut pending = Vec::new();
    let mut next = last_taken + step;
    while next <= end {
        pending.push(next);
        next += step;
    }

    Ok(BackfillPlan { taken, pending })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // parse_start_time
    // -----------------------------------------------------------------------

    #[test]
    fn parses_valid_time() {
        assert_eq!(parse_start_time("08:30").unwrap(), time(8, 30));
    }

    #[test]
    fn parses_without_leading_zero() {
        assert_eq!(parse_start_time("8:30").unwrap(), time(8, 30));
    }

    #[test]
    fn parses_midnight_and_end_of_day() {
        assert_eq!(parse_start_time("00:00").unwrap(), time(0, 0));
        assert_eq!(parse_start_time("23:59").unwrap(), time(23, 59));
    }

    #[test]
    fn rejects_out_of_range_hour() {
        assert!(parse_start_time("24:00").is_err());
    }

    #[test]
    fn rejects_out_of_range_minute() {
        assert!(parse_start_time("12:60").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_start_time("noonish").is_err());
        assert!(parse_start_time("").is_err());
        assert!(parse_start_time("08:30:00").is_err());
    }

    // -----------------------------------------------------------------------
    // validate_frequency
    // -----------------------------------------------------------------------

    #[test]
    fn accepts_frequency_bounds() {
        assert!(validate_frequency(0.5).is_ok());
        assert!(validate_frequency(8760.0).is_ok());
        assert!(validate_frequency(6.0).is_ok());
    }

    #[test]
    fn rejects_frequency_outside_bounds() {
        assert!(validate_frequency(0.4).is_err());
        assert!(validate_frequency(0.0).is_err());
        assert!(validate_frequency(-8.0).is_err());
        assert!(validate_frequency(8761.0).is_err());
    }

    #[test]
    fn rejects_nan_frequency() {
        assert!(validate_frequency(f64::NAN).is_err());
    }

    // -----------------------------------------------------------------------
    // next_occurrences
    // -----------------------------------------------------------------------

    #[test]
    fn first_occurrence_is_today_when_start_time_ahead() {
        let now = at(2026, 3, 10, 6, 0);
        let seq = next_occurrences(time(8, 0), 6.0, now, 7).unwrap();
        assert_eq!(seq[0], at(2026, 3, 10, 8, 0));
    }

    #[test]
    fn first_occurrence_rolls_to_tomorrow_when_passed() {
        let now = at(2026, 3, 10, 9, 0);
        let seq = next_occurrences(time(8, 0), 6.0, now, 7).unwrap();
        assert_eq!(seq[0], at(2026, 3, 11, 8, 0));
    }

    #[test]
    fn start_time_equal_to_now_rolls_to_tomorrow() {
        let now = at(2026, 3, 10, 8, 0);
        let seq = next_occurrences(time(8, 0), 6.0, now, 7).unwrap();
        assert_eq!(seq[0], at(2026, 3, 11, 8, 0));
    }

    #[test]
    fn consecutive_occurrences_are_spaced_by_frequency() {
        let now = at(2026, 3, 10, 6, 0);
        let seq = next_occurrences(time(8, 0), 6.0, now, 7).unwrap();
        for pair in seq.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(6));
        }
    }

    #[test]
    fn fractional_frequency_compounds_exactly() {
        let now = at(2026, 3, 10, 6, 0);
        let seq = next_occurrences(time(8, 0), 1.5, now, 2).unwrap();
        for pair in seq.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::minutes(90));
        }
        // 08:00 + 1.5h steps stays on the half-hour grid.
        assert_eq!(seq[1], at(2026, 3, 10, 9, 30));
    }

    #[test]
    fn all_occurrences_within_horizon_and_after_now() {
        let now = at(2026, 3, 10, 6, 0);
        let horizon_end = now + Duration::days(7);
        let seq = next_occurrences(time(8, 0), 6.0, now, 7).unwrap();
        assert!(!seq.is_empty());
        for t in &seq {
            assert!(*t >= now);
            assert!(*t <= horizon_end);
        }
    }

    #[test]
    fn strictly_increasing() {
        let now = at(2026, 3, 10, 6, 0);
        let seq = next_occurrences(time(8, 0), 0.5, now, 1).unwrap();
        for pair in seq.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn seven_day_horizon_at_six_hours_yields_expected_count() {
        // First dose 2h after now, then every 6h up to now + 7d: 28 doses.
        let now = at(2026, 3, 10, 6, 0);
        let seq = next_occurrences(time(8, 0), 6.0, now, 7).unwrap();
        assert_eq!(seq.len(), 28);
    }

    #[test]
    fn pure_function_of_inputs() {
        let now = at(2026, 3, 10, 6, 0);
        let a = next_occurrences(time(8, 0), 6.0, now, 7).unwrap();
        let b = next_occurrences(time(8, 0), 6.0, now, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_frequency() {
        let now = at(2026, 3, 10, 6, 0);
        assert!(next_occurrences(time(8, 0), 0.0, now, 7).is_err());
    }

    // -----------------------------------------------------------------------
    // backfill_plan
    // -----------------------------------------------------------------------

    #[test]
    fn backfill_three_doses_at_eight_hours() {
        let now = at(2026, 3, 10, 12, 0);
        let last = at(2026, 3, 10, 8, 0);
        let plan = backfill_plan(last, 3, 8.0, now, 7).unwrap();

        assert_eq!(
            plan.taken,
            vec![
                at(2026, 3, 9, 16, 0), // T-16h
                at(2026, 3, 10, 0, 0), // T-8h
                last,                  // T
            ]
        );
        assert_eq!(plan.pending[0], at(2026, 3, 10, 16, 0)); // T+8h
    }

    #[test]
    fn backfill_single_dose() {
        let now = at(2026, 3, 10, 12, 0);
        let last = at(2026, 3, 10, 8, 0);
        let plan = backfill_plan(last, 1, 8.0, now, 7).unwrap();
        assert_eq!(plan.taken, vec![last]);
    }

    #[test]
    fn backfill_forward_chain_bounded_by_horizon() {
        let now = at(2026, 3, 10, 12, 0);
        let last = at(2026, 3, 10, 8, 0);
        let plan = backfill_plan(last, 1, 8.0, now, 7).unwrap();
        let end = now + Duration::days(7);
        for t in &plan.pending {
            assert!(*t <= end);
        }
        for pair in plan.pending.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(8));
        }
    }

    #[test]
    fn backfill_rejects_zero_doses() {
        let now = at(2026, 3, 10, 12, 0);
        let last = at(2026, 3, 10, 8, 0);
        assert!(matches!(
            backfill_plan(last, 0, 8.0, now, 7),
            Err(ScheduleError::InvalidBackfill(_))
        ));
    }

    #[test]
    fn backfill_rejects_future_last_taken() {
        let now = at(2026, 3, 10, 12, 0);
        let last = at(2026, 3, 10, 13, 0);
        assert!(matches!(
            backfill_plan(last, 1, 8.0, now, 7),
            Err(ScheduleError::InvalidBackfill(_))
        ));
    }

    #[test]
    fn backfill_rejects_last_taken_older_than_a_year() {
        let now = at(2026, 3, 10, 12, 0);
        let last = at(2024, 3, 10, 12, 0);
        assert!(matches!(
            backfill_plan(last, 1, 8.0, now, 7),
            Err(ScheduleError::InvalidBackfill(_))
        ));
    }

    #[test]
    fn backfill_rejects_invalid_frequency() {
        let now = at(2026, 3, 10, 12, 0);
        let last = at(2026, 3, 10, 8, 0);
        assert!(matches!(
            backfill_plan(last, 1, 9000.0, now, 7),
            Err(ScheduleError::InvalidSchedule(_))
        ));
    }
}
