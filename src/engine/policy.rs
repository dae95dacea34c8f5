use chrono::{Duration, NaiveTime};

/// Working-day rules the status and duration calculations are measured against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendancePolicy {
    /// Nominal start of the workday; check-ins after it are late.
    pub expected_start: NaiveTime,
    /// Start of the unpaid lunch window.
    pub lunch_start: NaiveTime,
    /// End of the unpaid lunch window.
    pub lunch_end: NaiveTime,
    /// Net worked time beyond which minutes count as overtime.
    pub overtime_threshold: Duration,
    /// Lateness (in minutes) up to which a day is `Late` rather than `Half-day`.
    pub late_cutoff_minutes: i32,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            expected_start: hms(9, 0, 0),
            lunch_start: hms(12, 0, 0),
            lunch_end: hms(13, 0, 0),
            overtime_threshold: Duration::hours(9),
            late_cutoff_minutes: 30,
        }
    }
}

// constant arguments; always in range
fn hms(hour: u32, minute: u32, second: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, second).unwrap_or(NaiveTime::MIN)
}
