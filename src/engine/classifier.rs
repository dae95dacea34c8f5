use chrono::{NaiveDateTime, NaiveTime, Timelike};

use super::policy::AttendancePolicy;
use crate::model::attendance::AttendanceStatus;

/// Outcome of classifying a single check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: AttendanceStatus,
    pub late_minutes: i32,
}

impl Classification {
    const fn new(status: AttendanceStatus, late_minutes: i32) -> Self {
        Self {
            status,
            late_minutes,
        }
    }
}

/// Minutes since midnight, seconds dropped.
fn minute_of_day(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

/// Decide the day's status from the check-in alone.
///
/// Only the time of day is looked at, at minute granularity: a check-in at
/// 09:00:59 against a 09:00 start is on time.
pub fn classify(check_in: Option<NaiveDateTime>, policy: &AttendancePolicy) -> Classification {
    let Some(check_in) = check_in else {
        return Classification::new(AttendanceStatus::Absent, 0);
    };

    let late_minutes = minute_of_day(check_in.time()) - minute_of_day(policy.expected_start);
    if late_minutes <= 0 {
        return Classification::new(AttendanceStatus::Present, 0);
    }

    let status = if late_minutes <= policy.late_cutoff_minutes {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::HalfDay
    };

    Classification::new(status, late_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32, second: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, second)
    }

    #[test]
    fn missing_check_in_is_absent() {
        let result = classify(None, &AttendancePolicy::default());
        assert_eq!(result, Classification::new(AttendanceStatus::Absent, 0));
    }

    #[test]
    fn on_the_hour_is_present() {
        let result = classify(at(9, 0, 0), &AttendancePolicy::default());
        assert_eq!(result, Classification::new(AttendanceStatus::Present, 0));
    }

    #[test]
    fn seconds_past_the_start_are_ignored() {
        let result = classify(at(9, 0, 59), &AttendancePolicy::default());
        assert_eq!(result, Classification::new(AttendanceStatus::Present, 0));
    }

    #[test]
    fn thirty_minutes_late_is_still_late() {
        let result = classify(at(9, 30, 45), &AttendancePolicy::default());
        assert_eq!(result, Classification::new(AttendanceStatus::Late, 30));
    }

    #[test]
    fn thirty_one_minutes_late_is_half_day() {
        let result = classify(at(9, 31, 0), &AttendancePolicy::default());
        assert_eq!(result, Classification::new(AttendanceStatus::HalfDay, 31));
    }

    #[test]
    fn afternoon_arrival_is_half_day() {
        let result = classify(at(14, 15, 0), &AttendancePolicy::default());
        assert_eq!(result, Classification::new(AttendanceStatus::HalfDay, 315));
    }

    #[test]
    fn custom_start_time_shifts_the_boundary() {
        let policy = AttendancePolicy {
            expected_start: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            ..AttendancePolicy::default()
        };

        let result = classify(at(8, 45, 0), &policy);
        assert_eq!(result, Classification::new(AttendanceStatus::Late, 15));
    }

    proptest! {
        #[test]
        fn early_or_on_time_is_present(h in 0u32..9, m in 0u32..60, s in 0u32..60) {
            let result = classify(at(h, m, s), &AttendancePolicy::default());
            prop_assert_eq!(result, Classification::new(AttendanceStatus::Present, 0));
        }

        #[test]
        fn first_half_hour_is_late(m in 1u32..=30, s in 0u32..60) {
            let result = classify(at(9, m, s), &AttendancePolicy::default());
            prop_assert_eq!(result, Classification::new(AttendanceStatus::Late, m as i32));
        }

        #[test]
        fn after_half_past_is_half_day(minutes in (9 * 60 + 31)..(24 * 60u32), s in 0u32..60) {
            let result = classify(at(minutes / 60, minutes % 60, s), &AttendancePolicy::default());
            prop_assert_eq!(result.status, AttendanceStatus::HalfDay);
            prop_assert_eq!(result.late_minutes, minutes as i32 - 9 * 60);
        }
    }
}
