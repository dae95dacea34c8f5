use anyhow::Result;
use csv::WriterBuilder;
use rust_xlsxwriter::{Workbook, XlsxError};

use super::daily::{DailyReport, DailyReportRow};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const MISSING: &str = "-";

/// Column names of the workbook's detail sheet, one per report row field.
const DETAIL_COLUMNS: [&str; 8] = [
    "employee_id",
    "name",
    "department",
    "check_in",
    "check_out",
    "status",
    "late_minutes",
    "overtime_minutes",
];

fn summary_rows(report: &DailyReport) -> [(&'static str, usize); 4] {
    [
        ("Total Employees", report.total_employees),
        ("Present", report.present_count),
        ("Absent", report.absent_count),
        ("Late", report.late_count),
    ]
}

/// Summary block followed by one line per employee.
pub fn daily_report_csv(report: &DailyReport) -> Result<String> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    writer.write_record(["Daily Attendance Report", report.date.as_str()])?;
    writer.write_record([""])?;
    writer.write_record(["Summary"])?;
    for (metric, value) in summary_rows(report) {
        writer.write_record([metric, value.to_string().as_str()])?;
    }
    writer.write_record([""])?;

    writer.write_record([
        "Employee ID",
        "Name",
        "Department",
        "Check In",
        "Check Out",
        "Status",
        "Late Minutes",
        "Overtime Minutes",
    ])?;

    for row in &report.attendance_list {
        writer.write_record([
            row.employee_id.as_str(),
            row.name.as_str(),
            row.department.as_deref().unwrap_or(""),
            row.check_in.as_deref().unwrap_or(MISSING),
            row.check_out.as_deref().unwrap_or(MISSING),
            row.status.as_ref(),
            row.late_minutes.to_string().as_str(),
            row.overtime_minutes.to_string().as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("CSV flush failed: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

fn write_detail_row(sheet: &mut rust_xlsxwriter::Worksheet, line: u32, row: &DailyReportRow) -> Result<(), XlsxError> {
    sheet.write_string(line, 0, row.employee_id.as_str())?;
    sheet.write_string(line, 1, row.name.as_str())?;
    // missing values stay empty cells
    if let Some(department) = &row.department {
        sheet.write_string(line, 2, department.as_str())?;
    }
    if let Some(check_in) = &row.check_in {
        sheet.write_string(line, 3, check_in.as_str())?;
    }
    if let Some(check_out) = &row.check_out {
        sheet.write_string(line, 4, check_out.as_str())?;
    }
    sheet.write_string(line, 5, row.status.to_string())?;
    sheet.write_number(line, 6, f64::from(row.late_minutes))?;
    sheet.write_number(line, 7, f64::from(row.overtime_minutes))?;
    Ok(())
}

fn daily_report_workbook(report: &DailyReport) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    summary.write_string(0, 0, "Metric")?;
    summary.write_string(0, 1, "Value")?;
    for (line, (metric, value)) in (1u32..).zip(summary_rows(report)) {
        summary.write_string(line, 0, metric)?;
        summary.write_number(line, 1, value as f64)?;
    }

    let details = workbook.add_worksheet();
    details.set_name("Attendance Details")?;
    for (col, name) in (0u16..).zip(DETAIL_COLUMNS) {
        details.write_string(0, col, name)?;
    }
    for (line, row) in (1u32..).zip(&report.attendance_list) {
        write_detail_row(details, line, row)?;
    }

    Ok(workbook)
}

/// Two sheets: `Summary` (metric/value) and `Attendance Details`.
pub fn daily_report_xlsx(report: &DailyReport) -> Result<Vec<u8>> {
    let mut workbook = daily_report_workbook(report)?;
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::daily::build_daily_report;
    use crate::report::test_support::{employee, record};
    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn sample_report() -> DailyReport {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let employees = vec![
            employee("E1", "Ann, Jr.", Some("IT")),
            employee("E2", "Bob", None),
        ];
        let records = vec![record("E1", day, Some((9, 45)), Some((18, 0)))];
        build_daily_report(day, &employees, &records)
    }

    fn text(cell: &Data) -> Option<&str> {
        match cell {
            Data::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[test]
    fn writes_summary_and_rows() {
        let csv = daily_report_csv(&sample_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Daily Attendance Report,2026-03-10");
        assert!(lines.contains(&"Total Employees,2"));
        assert!(lines.contains(&"Absent,2"));
        assert!(lines.contains(
            &"Employee ID,Name,Department,Check In,Check Out,Status,Late Minutes,Overtime Minutes"
        ));
        assert!(lines.contains(&"E1,\"Ann, Jr.\",IT,09:45:00,18:00:00,Half-day,45,0"));
        assert!(lines.contains(&"E2,Bob,,-,-,Absent,0,0"));
    }

    #[test]
    fn workbook_has_summary_and_detail_sheets() {
        let bytes = daily_report_xlsx(&sample_report()).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();

        assert_eq!(workbook.sheet_names(), vec!["Summary", "Attendance Details"]);

        let summary = workbook.worksheet_range("Summary").unwrap();
        let summary_rows: Vec<&[Data]> = summary.rows().collect();
        assert_eq!(summary_rows.len(), 5);
        assert_eq!(text(&summary_rows[0][0]), Some("Metric"));
        assert_eq!(text(&summary_rows[1][0]), Some("Total Employees"));

        let details = workbook.worksheet_range("Attendance Details").unwrap();
        let detail_rows: Vec<&[Data]> = details.rows().collect();
        assert_eq!(detail_rows.len(), 3);
        assert_eq!(text(&detail_rows[0][0]), Some("employee_id"));
        assert_eq!(text(&detail_rows[1][0]), Some("E1"));
        assert_eq!(text(&detail_rows[1][1]), Some("Ann, Jr."));
        assert_eq!(text(&detail_rows[1][3]), Some("09:45:00"));
        assert_eq!(text(&detail_rows[1][5]), Some("Half-day"));
        assert_eq!(text(&detail_rows[2][5]), Some("Absent"));
    }
}
