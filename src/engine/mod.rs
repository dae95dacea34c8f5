//! Attendance status and worked-time rules.
//!
//! Everything here is pure: callers load a record, set the timestamps they
//! have, run [`evaluate`] and persist the result.

pub mod classifier;
pub mod duration;
pub mod policy;

pub use classifier::{Classification, classify};
pub use duration::{overtime_minutes, worked_duration};
pub use policy::AttendancePolicy;

use crate::model::attendance::AttendanceRecord;

/// Recompute status, lateness and (when checked out) overtime for a record.
///
/// Overtime is left alone unless a check-out is present, so a later
/// evaluation without one never clears it.
pub fn evaluate(record: &AttendanceRecord, policy: &AttendancePolicy) -> AttendanceRecord {
    let mut evaluated = record.clone();

    let Classification {
        status,
        late_minutes,
    } = classify(record.check_in, policy);
    evaluated.status = status;
    evaluated.late_minutes = late_minutes;

    if record.check_in.is_some() && record.check_out.is_some() {
        let worked = worked_duration(record.check_in, record.check_out, policy);
        evaluated.overtime_minutes = overtime_minutes(worked, policy);
    }

    evaluated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn at(hour: u32, minute: u32) -> Option<NaiveDateTime> {
        day().and_hms_opt(hour, minute, 0)
    }

    fn record(check_in: Option<NaiveDateTime>, check_out: Option<NaiveDateTime>) -> AttendanceRecord {
        let mut record = AttendanceRecord::draft("EMP001", day(), day().and_hms_opt(8, 0, 0).unwrap());
        record.check_in = check_in;
        record.check_out = check_out;
        record
    }

    #[test]
    fn check_in_only_sets_status_and_keeps_overtime() {
        let mut input = record(at(9, 20), None);
        input.overtime_minutes = 45;

        let out = evaluate(&input, &AttendancePolicy::default());

        assert_eq!(out.status, AttendanceStatus::Late);
        assert_eq!(out.late_minutes, 20);
        assert_eq!(out.overtime_minutes, 45);
    }

    #[test]
    fn check_out_recomputes_overtime() {
        let mut input = record(at(8, 0), at(19, 30));
        input.overtime_minutes = 5;

        let out = evaluate(&input, &AttendancePolicy::default());

        assert_eq!(out.status, AttendanceStatus::Present);
        assert_eq!(out.late_minutes, 0);
        assert_eq!(out.overtime_minutes, 90);
    }

    #[test]
    fn short_day_overwrites_previous_overtime_with_zero() {
        let mut input = record(at(9, 0), at(17, 0));
        input.overtime_minutes = 120;

        let out = evaluate(&input, &AttendancePolicy::default());

        assert_eq!(out.overtime_minutes, 0);
    }

    #[test]
    fn no_check_in_is_absent_and_leaves_overtime() {
        let mut input = record(None, at(18, 0));
        input.late_minutes = 12;
        input.overtime_minutes = 30;

        let out = evaluate(&input, &AttendancePolicy::default());

        assert_eq!(out.status, AttendanceStatus::Absent);
        assert_eq!(out.late_minutes, 0);
        assert_eq!(out.overtime_minutes, 30);
    }

    #[test]
    fn on_time_check_in_clears_stale_lateness() {
        let mut input = record(at(8, 55), None);
        input.status = AttendanceStatus::HalfDay;
        input.late_minutes = 50;

        let out = evaluate(&input, &AttendancePolicy::default());

        assert_eq!(out.status, AttendanceStatus::Present);
        assert_eq!(out.late_minutes, 0);
    }

    #[test]
    fn notes_are_untouched() {
        let mut input = record(at(10, 0), at(18, 0));
        input.notes = Some("doctor appointment".to_string());

        let out = evaluate(&input, &AttendancePolicy::default());

        assert_eq!(out.status, AttendanceStatus::HalfDay);
        assert_eq!(out.notes.as_deref(), Some("doctor appointment"));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let policy = AttendancePolicy::default();
        let input = record(at(9, 17), at(20, 5));

        let once = evaluate(&input, &policy);
        let twice = evaluate(&once, &policy);

        assert_eq!(once, twice);
    }
}
