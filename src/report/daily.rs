use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DATE_FORMAT, TIME_FORMAT};
use crate::model::employee::Employee;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyReportRow {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "John Doe")]
    pub name: String,
    pub department: Option<String>,
    #[schema(example = "09:04:10")]
    pub check_in: Option<String>,
    #[schema(example = "18:01:00")]
    pub check_out: Option<String>,
    pub status: AttendanceStatus,
    pub late_minutes: i32,
    pub overtime_minutes: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyReport {
    #[schema(example = "2026-03-10")]
    pub date: String,
    pub total_employees: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub late_count: usize,
    pub attendance_list: Vec<DailyReportRow>,
}

/// One row per employee, whether or not they have a record for `date`.
///
/// Only `Present` and `Late` days count as present; `Half-day`, `Leave` and
/// days without a check-in count as absent.
pub fn build_daily_report(date: NaiveDate, employees: &[Employee], records: &[AttendanceRecord]) -> DailyReport {
    let by_employee: HashMap<&str, &AttendanceRecord> = records
        .iter()
        .filter(|r| r.date == date)
        .map(|r| (r.employee_id.as_str(), r))
        .collect();

    let mut present_count = 0;
    let mut absent_count = 0;
    let mut late_count = 0;
    let mut attendance_list = Vec::with_capacity(employees.len());

    for employee in employees {
        let record = by_employee.get(employee.employee_id.as_str()).copied();

        let status = match record {
            Some(r) if r.check_in.is_some() => r.status,
            _ => AttendanceStatus::Absent,
        };

        match status {
            AttendanceStatus::Present => present_count += 1,
            AttendanceStatus::Late => {
                present_count += 1;
                late_count += 1;
            }
            _ => absent_count += 1,
        }

        attendance_list.push(DailyReportRow {
            employee_id: employee.employee_id.clone(),
            name: employee.name.clone(),
            department: employee.department.clone(),
            check_in: record
                .and_then(|r| r.check_in)
                .map(|t| t.format(TIME_FORMAT).to_string()),
            check_out: record
                .and_then(|r| r.check_out)
                .map(|t| t.format(TIME_FORMAT).to_string()),
            status,
            late_minutes: record.map_or(0, |r| r.late_minutes),
            overtime_minutes: record.map_or(0, |r| r.overtime_minutes),
        });
    }

    DailyReport {
        date: date.format(DATE_FORMAT).to_string(),
        total_employees: employees.len(),
        present_count,
        absent_count,
        late_count,
        attendance_list,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::{employee, record};

    #[test]
    fn counts_present_late_and_absent() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let employees = vec![
            employee("E1", "Ann", Some("IT")),
            employee("E2", "Bob", Some("IT")),
            employee("E3", "Cid", None),
            employee("E4", "Dee", None),
            employee("E5", "Eve", None),
        ];
        let records = vec![
            record("E1", day, Some((8, 55)), Some((18, 0))),
            record("E2", day, Some((9, 20)), None),
            record("E3", day, Some((10, 0)), None),
            record("E4", day, None, None),
        ];

        let report = build_daily_report(day, &employees, &records);

        assert_eq!(report.date, "2026-03-10");
        assert_eq!(report.total_employees, 5);
        assert_eq!(report.present_count, 2);
        assert_eq!(report.late_count, 1);
        // half-day, record without check-in, no record at all
        assert_eq!(report.absent_count, 3);

        let bob = &report.attendance_list[1];
        assert_eq!(bob.status, AttendanceStatus::Late);
        assert_eq!(bob.late_minutes, 20);
        assert_eq!(bob.check_in.as_deref(), Some("09:20:00"));
        assert_eq!(bob.check_out, None);

        let eve = &report.attendance_list[4];
        assert_eq!(eve.status, AttendanceStatus::Absent);
        assert_eq!(eve.check_in, None);
    }

    #[test]
    fn records_for_other_days_are_ignored() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let other = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let employees = vec![employee("E1", "Ann", None)];
        let records = vec![record("E1", other, Some((9, 0)), None)];

        let report = build_daily_report(day, &employees, &records);

        assert_eq!(report.present_count, 0);
        assert_eq!(report.absent_count, 1);
    }
}
