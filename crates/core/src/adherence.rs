//! Adherence-rate math for dose statistics.

/// Percentage of due doses actually taken: taken / (taken + missed) * 100,
/// rounded to the nearest whole percent. Returns 0 when no dose has reached
/// a taken/missed outcome yet.
pub fn adherence_rate(taken: i64, missed: i64) -> i64 {
    let outcomes = taken + missed;
    if outcomes <= 0 {
        return 0;
    }
    (taken as f64 / outcomes as f64 * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_taken_two_missed_is_eighty_percent() {
        assert_eq!(adherence_rate(8, 2), 80);
    }

    #[test]
    fn no_outcomes_is_zero_not_division_error() {
        assert_eq!(adherence_rate(0, 0), 0);
    }

    #[test]
    fn all_taken_is_one_hundred() {
        assert_eq!(adherence_rate(5, 0), 100);
    }

    #[test]
    fn all_missed_is_zero() {
        assert_eq!(adherence_rate(0, 4), 0);
    }

    #[test]
    fn rounds_to_nearest_percent() {
        assert_eq!(adherence_rate(1, 2), 33);
        assert_eq!(adherence_rate(2, 1), 67);
    }
}
