use crate::{
    api::{
        attendance::RECORD_COLUMNS,
        employee::{EMPLOYEE_COLUMNS, find_employee},
    },
    auth::auth::AuthUser,
    error::AppError,
    model::{
        attendance::{AttendanceRecord, AttendanceStatus},
        employee::Employee,
    },
    report::{
        daily::{DailyReport, build_daily_report},
        export::{CSV_CONTENT_TYPE, XLSX_CONTENT_TYPE, daily_report_csv, daily_report_xlsx},
        monthly::{Month, build_employee_summary, build_monthly_report},
        statistics::build_statistics,
    },
    utils::validators::parse_date,
};
use actix_web::{HttpResponse, http::header, web};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{error, info, warn};
use utoipa::IntoParams;

const STATISTICS_DEFAULT_DAYS: i64 = 30;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DailyQuery {
    /// `YYYY-MM-DD`, defaults to today
    pub date: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthlyQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatisticsQuery {
    /// Defaults to 30 days before `end_date`
    pub start_date: Option<String>,
    /// Defaults to today
    pub end_date: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    pub date: Option<String>,
    /// `csv` (default) or `excel`
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.unwrap_or("csv").trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" => Ok(Self::Excel),
            _ => Err(AppError::bad_request("Unsupported format")),
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            Self::Csv => CSV_CONTENT_TYPE,
            Self::Excel => XLSX_CONTENT_TYPE,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn date_param(value: Option<&str>, field: &str, default: NaiveDate) -> Result<NaiveDate, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => parse_date(v).ok_or_else(|| AppError::bad_request(format!("Invalid {}. Use YYYY-MM-DD", field))),
    }
}

fn month_param(year: Option<i32>, month: Option<u32>) -> Result<Month, AppError> {
    let now = today();
    Month::new(year.unwrap_or(now.year()), month.unwrap_or(now.month()))
        .ok_or_else(|| AppError::bad_request("Invalid year or month"))
}

async fn active_employees(pool: &MySqlPool, department: Option<&str>) -> Result<Vec<Employee>, sqlx::Error> {
    let department = department.map(str::trim).filter(|d| !d.is_empty());
    let sql = format!(
        "SELECT {} FROM employees WHERE is_active = TRUE{} ORDER BY name ASC",
        EMPLOYEE_COLUMNS,
        if department.is_some() { " AND department = ?" } else { "" }
    );

    let mut query = sqlx::query_as::<_, Employee>(&sql);
    if let Some(d) = department {
        query = query.bind(d);
    }
    query.fetch_all(pool).await
}

async fn records_between(
    pool: &MySqlPool,
    start: NaiveDate,
    end: NaiveDate,
    employee_id: Option<&str>,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM attendance WHERE date BETWEEN ? AND ?{} ORDER BY date ASC, employee_id ASC",
        RECORD_COLUMNS,
        if employee_id.is_some() { " AND employee_id = ?" } else { "" }
    );

    let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql).bind(start).bind(end);
    if let Some(code) = employee_id {
        query = query.bind(code);
    }
    query.fetch_all(pool).await
}

async fn load_daily_report(pool: &MySqlPool, date: NaiveDate, department: Option<&str>) -> Result<DailyReport, AppError> {
    let employees = active_employees(pool, department).await?;
    let records = records_between(pool, date, date, None).await?;

    Ok(build_daily_report(date, &employees, &records))
}

/// Daily attendance report
#[utoipa::path(
    get,
    path = "/api/reports/daily",
    params(DailyQuery),
    responses(
        (status = 200, body = DailyReport),
        (status = 400, description = "Invalid date"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
pub async fn daily_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DailyQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let date = date_param(query.date.as_deref(), "date", today())?;
    let report = load_daily_report(pool.get_ref(), date, query.department.as_deref()).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Monthly attendance report
#[utoipa::path(
    get,
    path = "/api/reports/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, body = MonthlyReport),
        (status = 400, description = "Invalid year or month"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
pub async fn monthly_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthlyQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let month = month_param(query.year, query.month)?;
    let code = query.employee_id.as_deref().map(str::trim).filter(|c| !c.is_empty());

    let employee = match code {
        Some(c) => Some(
            find_employee(pool.get_ref(), c)
                .await?
                .ok_or_else(|| AppError::not_found("Employee not found"))?,
        ),
        None => None,
    };

    let records = records_between(pool.get_ref(), month.start, month.end, code).await?;

    Ok(HttpResponse::Ok().json(build_monthly_report(&month, employee.as_ref(), &records)))
}

/// One employee's month in numbers
#[utoipa::path(
    get,
    path = "/api/reports/employee-summary/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee code"),
        SummaryQuery
    ),
    responses(
        (status = 200, body = EmployeeSummary),
        (status = 400, description = "Invalid year or month"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
pub async fn employee_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    query: web::Query<SummaryQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let month = month_param(query.year, query.month)?;
    let employee = find_employee(pool.get_ref(), &path)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    let records = records_between(pool.get_ref(), month.start, month.end, Some(&employee.employee_id)).await?;

    Ok(HttpResponse::Ok().json(build_employee_summary(&month, &employee, &records)))
}

/// Attendance statistics over a date range
#[utoipa::path(
    get,
    path = "/api/reports/statistics",
    params(StatisticsQuery),
    responses(
        (status = 200, body = AttendanceStatistics),
        (status = 400, description = "Invalid date range")
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
pub async fn statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StatisticsQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let end = date_param(query.end_date.as_deref(), "end_date", today())?;
    let start = date_param(
        query.start_date.as_deref(),
        "start_date",
        end - Duration::days(STATISTICS_DEFAULT_DAYS),
    )?;
    if start > end {
        return Err(AppError::bad_request("start_date must not be after end_date"));
    }

    let department = query.department.as_deref().map(str::trim).filter(|d| !d.is_empty());
    let sql = format!(
        r#"
        SELECT a.date, a.status
        FROM attendance a
        JOIN employees e ON e.employee_id = a.employee_id
        WHERE a.date BETWEEN ? AND ?{}
        "#,
        if department.is_some() { " AND e.department = ?" } else { "" }
    );

    let mut q = sqlx::query_as::<_, (NaiveDate, String)>(&sql).bind(start).bind(end);
    if let Some(d) = department {
        q = q.bind(d);
    }
    let raw = q.fetch_all(pool.get_ref()).await?;

    let rows: Vec<(NaiveDate, AttendanceStatus)> = raw
        .into_iter()
        .filter_map(|(date, status)| match AttendanceStatus::try_from(status) {
            Ok(s) => Some((date, s)),
            Err(e) => {
                warn!(date = %date, error = %e, "Skipping record with unknown status");
                None
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(build_statistics(start, end, &rows)))
}

/// Download the daily report
#[utoipa::path(
    get,
    path = "/api/reports/export/daily",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment, or an Excel workbook with `Summary` and `Attendance Details` sheets",
            content_type = ["text/csv", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"]),
        (status = 400, description = "Unsupported format", body = Object, example = json!({
            "message": "Unsupported format"
        }))
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
pub async fn export_daily(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let format = ExportFormat::parse(query.format.as_deref())?;
    let date = date_param(query.date.as_deref(), "date", today())?;
    let report = load_daily_report(pool.get_ref(), date, None).await?;

    let body = match format {
        ExportFormat::Csv => daily_report_csv(&report).map(String::into_bytes),
        ExportFormat::Excel => daily_report_xlsx(&report),
    }
    .map_err(|e| {
        error!(error = %e, date = %date, format = ?format, "Failed to render daily report");
        AppError::Internal
    })?;

    info!(by = %auth.actor(), date = %date, format = ?format, rows = report.attendance_list.len(), "Daily report exported");

    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=attendance_report_{}.{}", report.date, format.extension()),
        ))
        .body(body))
}
