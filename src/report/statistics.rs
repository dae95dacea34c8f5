use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::monthly::round2;
use crate::model::attendance::{AttendanceStatus, DATE_FORMAT};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DailyStatistics {
    #[schema(example = "2026-03-10")]
    pub date: String,
    pub total: u32,
    pub present: u32,
    pub late: u32,
    pub absent: u32,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct OverallStatistics {
    pub total_records: u32,
    pub total_present: u32,
    pub total_late: u32,
    /// Every record that is not `Present`, late days included
    pub total_absent: u32,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatisticsPeriod {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceStatistics {
    pub period: StatisticsPeriod,
    pub daily_statistics: Vec<DailyStatistics>,
    pub overall_statistics: OverallStatistics,
}

fn rate(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(part as f64 / total as f64 * 100.0)
    }
}

/// Per-day and overall counts over stored records only; days without any
/// record are not reported. The rate counts `Present` alone.
pub fn build_statistics(start: NaiveDate, end: NaiveDate, rows: &[(NaiveDate, AttendanceStatus)]) -> AttendanceStatistics {
    let mut per_day: BTreeMap<NaiveDate, DailyStatistics> = BTreeMap::new();

    for (date, status) in rows.iter().filter(|(d, _)| *d >= start && *d <= end) {
        let day = per_day.entry(*date).or_default();
        day.total += 1;
        match status {
            AttendanceStatus::Present => day.present += 1,
            AttendanceStatus::Late => day.late += 1,
            AttendanceStatus::Absent => day.absent += 1,
            _ => {}
        }
    }

    let mut overall = OverallStatistics::default();
    let daily_statistics = per_day
        .into_iter()
        .map(|(date, mut day)| {
            day.date = date.format(DATE_FORMAT).to_string();
            day.attendance_rate = rate(day.present, day.total);

            overall.total_records += day.total;
            overall.total_present += day.present;
            overall.total_late += day.late;
            day
        })
        .collect();

    overall.total_absent = overall.total_records - overall.total_present;
    overall.attendance_rate = rate(overall.total_present, overall.total_records);

    AttendanceStatistics {
        period: StatisticsPeriod {
            start_date: start.format(DATE_FORMAT).to_string(),
            end_date: end.format(DATE_FORMAT).to_string(),
        },
        daily_statistics,
        overall_statistics: overall,
    }
}
