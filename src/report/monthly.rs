use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceResponse, AttendanceStatus, DATE_FORMAT};
use crate::model::employee::{Employee, EmployeeResponse};
use crate::utils::date_utils::{days_between, is_workday, working_days};

/// Holidays are not stored, so only weekends are skipped.
const NO_HOLIDAYS: &[NaiveDate] = &[];

#[derive(Debug, Clone, Copy)]
pub struct Month {
    pub year: i32,
    pub month: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let (start, end) = crate::utils::date_utils::month_bounds(year, month)?;
        Some(Self {
            year,
            month,
            start,
            end,
        })
    }

    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Period {
    pub year: i32,
    pub month: u32,
    #[schema(example = "2026-03-01")]
    pub start_date: String,
    #[schema(example = "2026-03-31")]
    pub end_date: String,
}

impl From<&Month> for Period {
    fn from(m: &Month) -> Self {
        Self {
            year: m.year,
            month: m.month,
            start_date: m.start.format(DATE_FORMAT).to_string(),
            end_date: m.end.format(DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub start_date: String,
    pub end_date: String,
    pub total_days: i64,
    pub work_days: u32,
    pub employee_info: Option<EmployeeResponse>,
    /// Records grouped by employee code
    pub attendance_data: BTreeMap<String, Vec<AttendanceResponse>>,
}

pub fn build_monthly_report(month: &Month, employee: Option<&Employee>, records: &[AttendanceRecord]) -> MonthlyReport {
    let mut attendance_data: BTreeMap<String, Vec<AttendanceResponse>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.date >= month.start && r.date <= month.end) {
        attendance_data
            .entry(record.employee_id.clone())
            .or_default()
            .push(AttendanceResponse::from(record));
    }

    MonthlyReport {
        year: month.year,
        month: month.month,
        start_date: month.start.format(DATE_FORMAT).to_string(),
        end_date: month.end.format(DATE_FORMAT).to_string(),
        total_days: month.total_days(),
        work_days: working_days(month.start, month.end, NO_HOLIDAYS),
        employee_info: employee.map(EmployeeResponse::from),
        attendance_data,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SummaryStatistics {
    pub total_days: i64,
    pub work_days: u32,
    pub present_days: u32,
    pub late_days: u32,
    pub absent_days: u32,
    /// Percentage of work days with a check-in, 2 decimals
    pub attendance_rate: f64,
    pub total_late_minutes: i64,
    pub total_overtime_minutes: i64,
    pub average_late_minutes: f64,
    pub average_overtime_minutes: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeSummary {
    pub employee: EmployeeResponse,
    pub period: Period,
    pub statistics: SummaryStatistics,
    pub attendance_details: Vec<AttendanceResponse>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Walks the work days (Mon-Fri) of the month. Weekend records are listed
/// in the details but never counted.
pub fn summarize_month(month: &Month, records: &[AttendanceRecord]) -> SummaryStatistics {
    let by_date: HashMap<NaiveDate, &AttendanceRecord> = records.iter().map(|r| (r.date, r)).collect();

    let mut stats = SummaryStatistics {
        total_days: month.total_days(),
        ..SummaryStatistics::default()
    };

    for day in days_between(month.start, month.end).filter(|d| is_workday(*d, NO_HOLIDAYS)) {
        stats.work_days += 1;

        match by_date.get(&day) {
            Some(record) if record.check_in.is_some() => {
                stats.present_days += 1;
                if record.status == AttendanceStatus::Late {
                    stats.late_days += 1;
                    stats.total_late_minutes += i64::from(record.late_minutes);
                }
                stats.total_overtime_minutes += i64::from(record.overtime_minutes);
            }
            _ => stats.absent_days += 1,
        }
    }

    if stats.work_days > 0 {
        stats.attendance_rate = round2(stats.present_days as f64 / stats.work_days as f64 * 100.0);
    }
    if stats.late_days > 0 {
        stats.average_late_minutes = round2(stats.total_late_minutes as f64 / stats.late_days as f64);
    }
    if stats.present_days > 0 {
        stats.average_overtime_minutes =
            round2(stats.total_overtime_minutes as f64 / stats.present_days as f64);
    }

    stats
}

pub fn build_employee_summary(month: &Month, employee: &Employee, records: &[AttendanceRecord]) -> EmployeeSummary {
    let own: Vec<AttendanceRecord> = records
        .iter()
        .filter(|r| r.employee_id == employee.employee_id && r.date >= month.start && r.date <= month.end)
        .cloned()
        .collect();

    EmployeeSummary {
        employee: EmployeeResponse::from(employee),
        period: Period::from(month),
        statistics: summarize_month(month, &own),
        attendance_details: own.iter().map(AttendanceResponse::from).collect(),
    }
}
