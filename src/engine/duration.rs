use chrono::{Duration, NaiveDateTime};

use super::policy::AttendancePolicy;

/// Net time worked between check-in and check-out, with the lunch window
/// on the check-in's date taken out.
///
/// An end falling inside lunch is first moved to the nearest lunch edge,
/// then whatever overlap with lunch remains is subtracted. An inverted input
/// (`check_out < check_in`) is not guarded and comes back negative.
pub fn worked_duration(
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    policy: &AttendancePolicy,
) -> Duration {
    let (Some(raw_in), Some(raw_out)) = (check_in, check_out) else {
        return Duration::zero();
    };

    let day = raw_in.date();
    let lunch_start = day.and_time(policy.lunch_start);
    let lunch_end = day.and_time(policy.lunch_end);

    let mut start = raw_in;
    if start >= lunch_start && start < lunch_end {
        start = lunch_end;
    }

    let mut end = raw_out;
    if end > lunch_start && end <= lunch_end {
        end = lunch_start;
    }

    let mut total = end - start;

    if start < lunch_end && end > lunch_start {
        let overlap = lunch_end.min(end) - lunch_start.max(start);
        total -= overlap.max(Duration::zero());
    }

    // both ends inside lunch: clamping crossed them over
    if raw_out >= raw_in {
        total = total.max(Duration::zero());
    }

    total
}

fn as_hours(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0 / 3600.0,
        None => duration.num_seconds() as f64 / 3600.0,
    }
}

/// Whole minutes worked beyond the policy's overtime threshold, truncated.
pub fn overtime_minutes(worked: Duration, policy: &AttendancePolicy) -> i32 {
    let worked_hours = as_hours(worked);
    let threshold_hours = as_hours(policy.overtime_threshold);

    if worked_hours > threshold_hours {
        ((worked_hours - threshold_hours) * 60.0) as i32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
    }

    fn worked(check_in: (u32, u32), check_out: (u32, u32)) -> Duration {
        worked_duration(
            at(check_in.0, check_in.1),
            at(check_out.0, check_out.1),
            &AttendancePolicy::default(),
        )
    }

    #[test]
    fn regular_day_loses_the_lunch_hour() {
        let duration = worked((9, 0), (18, 0));

        assert_eq!(duration, Duration::hours(8));
        assert_eq!(overtime_minutes(duration, &AttendancePolicy::default()), 0);
    }

    #[test]
    fn long_day_earns_overtime() {
        let duration = worked((8, 0), (19, 0));

        assert_eq!(duration, Duration::hours(10));
        assert_eq!(overtime_minutes(duration, &AttendancePolicy::default()), 60);
    }

    #[test]
    fn twelve_hour_day_earns_two_hours_overtime() {
        let duration = worked((8, 0), (20, 0));

        assert_eq!(duration, Duration::hours(11));
        assert_eq!(overtime_minutes(duration, &AttendancePolicy::default()), 120);
    }

    #[test]
    fn shift_inside_lunch_counts_nothing() {
        assert_eq!(worked((12, 30), (12, 45)), Duration::zero());
    }

    #[test]
    fn check_in_during_lunch_starts_at_lunch_end() {
        assert_eq!(worked((12, 30), (17, 0)), Duration::hours(4));
    }

    #[test]
    fn check_out_during_lunch_stops_at_lunch_start() {
        assert_eq!(worked((8, 0), (12, 30)), Duration::hours(4));
    }

    #[test]
    fn check_out_exactly_at_lunch_end_stops_at_lunch_start() {
        assert_eq!(worked((9, 0), (13, 0)), Duration::hours(3));
    }

    #[test]
    fn check_in_exactly_at_lunch_start_moves_to_lunch_end() {
        assert_eq!(worked((12, 0), (15, 0)), Duration::hours(2));
    }

    #[test]
    fn morning_only_is_untouched() {
        assert_eq!(worked((8, 15), (11, 45)), Duration::minutes(210));
    }

    #[test]
    fn inverted_interval_is_negative() {
        assert_eq!(worked((15, 0), (10, 0)), Duration::hours(-5));
    }

    #[test]
    fn missing_timestamp_is_zero() {
        let policy = AttendancePolicy::default();

        assert_eq!(worked_duration(at(9, 0), None, &policy), Duration::zero());
        assert_eq!(worked_duration(None, at(18, 0), &policy), Duration::zero());
        assert_eq!(overtime_minutes(Duration::zero(), &policy), 0);
    }

    #[test]
    fn exactly_nine_hours_is_not_overtime() {
        assert_eq!(overtime_minutes(Duration::hours(9), &AttendancePolicy::default()), 0);
    }

    #[test]
    fn overtime_is_truncated_to_whole_minutes() {
        let worked = Duration::hours(9) + Duration::minutes(30) + Duration::seconds(40);
        assert_eq!(overtime_minutes(worked, &AttendancePolicy::default()), 30);
    }

    #[test]
    fn negative_duration_has_no_overtime() {
        assert_eq!(overtime_minutes(Duration::hours(-3), &AttendancePolicy::default()), 0);
    }
}
