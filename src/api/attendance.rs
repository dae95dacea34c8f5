use crate::{
    api::employee::find_employee,
    auth::auth::AuthUser,
    config::Config,
    engine::evaluate,
    error::{AppError, is_duplicate_key},
    model::attendance::{AttendanceRecord, AttendanceResponse, AttendanceStatus, TIME_FORMAT},
    utils::{
        pagination::{Page, PageInfo},
        validators::{AttendanceInput, parse_date, parse_time, validate_attendance},
    },
};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, warn};
use utoipa::{IntoParams, ToSchema};

pub(crate) const RECORD_COLUMNS: &str = "id, employee_id, date, check_in, check_out, status, \
     late_minutes, overtime_minutes, notes, created_at, updated_at";

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckInOut {
    /// Defaults to the caller; HR/Admin may act for anyone
    #[schema(example = "EMP-001")]
    pub employee_id: Option<String>,
    #[schema(example = "Working from the east office")]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManualAttendance {
    #[schema(example = "EMP-001")]
    pub employee_id: Option<String>,
    #[schema(example = "2026-03-10", format = "date")]
    pub date: Option<String>,
    #[schema(example = "09:05:00")]
    pub check_in_time: Option<String>,
    #[schema(example = "18:10:00")]
    pub check_out_time: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[schema(example = "09:05:00")]
    pub check_in_time: Option<String>,
    #[schema(example = "18:10:00")]
    pub check_out_time: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TodayQuery {
    /// Defaults to the caller
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Inclusive, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive, `YYYY-MM-DD`
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TodayStatus {
    pub has_checked_in: bool,
    pub has_checked_out: bool,
    #[schema(example = "09:05:00")]
    pub check_in_time: Option<String>,
    #[schema(example = "18:10:00")]
    pub check_out_time: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub late_minutes: i32,
    pub overtime_minutes: i32,
    pub notes: Option<String>,
}

impl TodayStatus {
    fn from_record(record: Option<&AttendanceRecord>) -> Self {
        match record {
            Some(r) => Self {
                has_checked_in: r.check_in.is_some(),
                has_checked_out: r.check_out.is_some(),
                check_in_time: r.check_in.map(|t| t.format(TIME_FORMAT).to_string()),
                check_out_time: r.check_out.map(|t| t.format(TIME_FORMAT).to_string()),
                status: Some(r.status),
                late_minutes: r.late_minutes,
                overtime_minutes: r.overtime_minutes,
                notes: r.notes.clone(),
            },
            None => Self {
                has_checked_in: false,
                has_checked_out: false,
                check_in_time: None,
                check_out_time: None,
                status: None,
                late_minutes: 0,
                overtime_minutes: 0,
                notes: None,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub history: Vec<AttendanceResponse>,
    #[serde(flatten)]
    pub pagination: PageInfo,
}

/// Which stored state an update is allowed to overwrite.
#[derive(Debug, Clone, Copy)]
enum Guard {
    Any,
    NotCheckedIn,
    NotCheckedOut,
}

impl Guard {
    fn clause(self) -> &'static str {
        match self {
            Guard::Any => "",
            Guard::NotCheckedIn => " AND check_in IS NULL",
            Guard::NotCheckedOut => " AND check_out IS NULL",
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

async fn find_record(pool: &MySqlPool, employee_id: &str, date: NaiveDate) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let sql = format!("SELECT {} FROM attendance WHERE employee_id = ? AND date = ?", RECORD_COLUMNS);

    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(pool)
        .await
}

async fn find_record_by_id(pool: &MySqlPool, id: u64) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let sql = format!("SELECT {} FROM attendance WHERE id = ?", RECORD_COLUMNS);

    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

async fn insert_record(pool: &MySqlPool, record: &AttendanceRecord) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, date, check_in, check_out, status, late_minutes, overtime_minutes, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.employee_id)
    .bind(record.date)
    .bind(record.check_in)
    .bind(record.check_out)
    .bind(record.status.as_ref())
    .bind(record.late_minutes)
    .bind(record.overtime_minutes)
    .bind(&record.notes)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

/// Writes timestamps and the evaluated fields together; false when the
/// guard no longer holds.
async fn update_record(pool: &MySqlPool, record: &AttendanceRecord, guard: Guard) -> Result<bool, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE attendance
        SET check_in = ?, check_out = ?, status = ?, late_minutes = ?, overtime_minutes = ?, notes = ?
        WHERE id = ?{}
        "#,
        guard.clause()
    );

    let result = sqlx::query(&sql)
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.status.as_ref())
        .bind(record.late_minutes)
        .bind(record.overtime_minutes)
        .bind(&record.notes)
        .bind(record.id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

async fn reload(pool: &MySqlPool, id: u64) -> Result<AttendanceRecord, AppError> {
    find_record_by_id(pool, id).await?.ok_or_else(|| {
        tracing::error!(id, "Attendance record vanished after write");
        AppError::Internal
    })
}

fn ensure_ordered(record: &AttendanceRecord) -> Result<(), AppError> {
    match (record.check_in, record.check_out) {
        (Some(check_in), Some(check_out)) if check_out < check_in => Err(AppError::Validation(vec![
            "Check-out time cannot be before check-in time".to_string(),
        ])),
        _ => Ok(()),
    }
}

fn time_on(date: NaiveDate, value: &str, field: &str) -> Result<NaiveDateTime, AppError> {
    parse_time(value)
        .map(|t| date.and_time(t))
        .ok_or_else(|| AppError::Validation(vec![format!("Invalid {} time format. Use HH:MM:SS", field)]))
}

fn append_note(existing: Option<String>, note: Option<String>) -> Option<String> {
    match (existing, note.filter(|n| !n.trim().is_empty())) {
        (Some(old), Some(new)) if !old.is_empty() => Some(format!("{}; {}", old, new)),
        (_, Some(new)) => Some(new),
        (old, None) => old,
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInOut,
    responses(
        (status = 200, description = "Checked in", body = Object, example = json!({
            "message": "Check-in successful",
            "attendance": { "employee_id": "EMP-001", "status": "Late", "late_minutes": 5 }
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found or inactive")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: Option<web::Json<CheckInOut>>,
) -> Result<HttpResponse, AppError> {
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    let employee_id = auth.resolve_employee(body.employee_id.as_deref())?;

    find_employee(pool.get_ref(), &employee_id)
        .await?
        .filter(|e| e.is_active)
        .ok_or_else(|| AppError::not_found("Employee not found or inactive"))?;

    let now = now();
    let today = now.date();
    let existing = find_record(pool.get_ref(), &employee_id, today).await?;

    if existing.as_ref().is_some_and(|r| r.check_in.is_some()) {
        return Err(AppError::bad_request("Already checked in today"));
    }

    let mut record = existing
        .clone()
        .unwrap_or_else(|| AttendanceRecord::draft(&employee_id, today, now));
    record.check_in = Some(now);
    record.notes = body.notes;
    let record = evaluate(&record, &config.policy);

    let id = match existing {
        Some(_) => {
            if !update_record(pool.get_ref(), &record, Guard::NotCheckedIn).await? {
                return Err(AppError::bad_request("Already checked in today"));
            }
            record.id
        }
        None => match insert_record(pool.get_ref(), &record).await {
            Ok(id) => id,
            Err(e) if is_duplicate_key(&e) => {
                return Err(AppError::bad_request("Already checked in today"));
            }
            Err(e) => return Err(e.into()),
        },
    };

    info!(
        by = %auth.actor(),
        employee_id = %employee_id,
        status = %record.status,
        late_minutes = record.late_minutes,
        "Checked in"
    );

    let saved = reload(pool.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Check-in successful",
        "attendance": AttendanceResponse::from(&saved)
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = CheckInOut,
    responses(
        (status = 200, description = "Checked out", body = Object, example = json!({
            "message": "Check-out successful",
            "attendance": { "employee_id": "EMP-001", "overtime_minutes": 45 }
        })),
        (status = 400, description = "No check-in today or already checked out", body = Object, example = json!({
            "message": "No check-in record found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: Option<web::Json<CheckInOut>>,
) -> Result<HttpResponse, AppError> {
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    let employee_id = auth.resolve_employee(body.employee_id.as_deref())?;

    let now = now();
    let mut record = find_record(pool.get_ref(), &employee_id, now.date())
        .await?
        .ok_or_else(|| AppError::bad_request("No check-in record found for today"))?;

    if record.check_out.is_some() {
        return Err(AppError::bad_request("Already checked out today"));
    }

    record.check_out = Some(now);
    record.notes = append_note(record.notes.take(), body.notes);
    let record = evaluate(&record, &config.policy);

    if !update_record(pool.get_ref(), &record, Guard::NotCheckedOut).await? {
        return Err(AppError::bad_request("Already checked out today"));
    }

    info!(
        by = %auth.actor(),
        employee_id = %employee_id,
        overtime_minutes = record.overtime_minutes,
        "Checked out"
    );

    let saved = reload(pool.get_ref(), record.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Check-out successful",
        "attendance": AttendanceResponse::from(&saved)
    })))
}

/// Today's attendance state
#[utoipa::path(
    get,
    path = "/api/attendance/status/today",
    params(TodayQuery),
    responses(
        (status = 200, body = TodayStatus),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TodayQuery>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.resolve_employee(query.employee_id.as_deref())?;

    find_employee(pool.get_ref(), &employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    let record = find_record(pool.get_ref(), &employee_id, now().date()).await?;

    Ok(HttpResponse::Ok().json(TodayStatus::from_record(record.as_ref())))
}

/// Attendance history of one employee, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee code"),
        HistoryQuery
    ),
    responses(
        (status = 200, body = HistoryResponse),
        (status = 400, description = "Invalid date filter"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.resolve_employee(Some(path.as_str()))?;
    let page = Page::new(query.page, query.per_page, 30, 100);

    let parse = |value: &Option<String>, field: &str| -> Result<Option<NaiveDate>, AppError> {
        match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(v) => parse_date(v)
                .map(Some)
                .ok_or_else(|| AppError::bad_request(format!("Invalid {}. Use YYYY-MM-DD", field))),
        }
    };
    let start_date = parse(&query.start_date, "start_date")?;
    let end_date = parse(&query.end_date, "end_date")?;

    let mut where_sql = String::from(" WHERE employee_id = ?");
    if start_date.is_some() {
        where_sql.push_str(" AND date >= ?");
    }
    if end_date.is_some() {
        where_sql.push_str(" AND date <= ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql).bind(&employee_id);
    for d in [start_date, end_date].into_iter().flatten() {
        count_q = count_q.bind(d);
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {} FROM attendance{} ORDER BY date DESC LIMIT ? OFFSET ?",
        RECORD_COLUMNS, where_sql
    );
    debug!(sql = %data_sql, employee_id = %employee_id, page = page.page, "Fetching attendance history");

    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql).bind(&employee_id);
    for d in [start_date, end_date].into_iter().flatten() {
        data_q = data_q.bind(d);
    }
    let records = data_q
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(HistoryResponse {
        history: records.iter().map(AttendanceResponse::from).collect(),
        pagination: page.info(total),
    }))
}

/// Record attendance by hand (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/attendance/manual",
    request_body = ManualAttendance,
    responses(
        (status = 201, description = "Manual attendance recorded", body = Object, example = json!({
            "message": "Manual attendance recorded successfully"
        })),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "errors": ["Date is required"]
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn manual_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<ManualAttendance>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let body = body.into_inner();

    let errors = validate_attendance(&AttendanceInput {
        employee_id: body.employee_id.as_deref(),
        date: body.date.as_deref(),
        check_in_time: body.check_in_time.as_deref(),
        check_out_time: body.check_out_time.as_deref(),
    });
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let employee_id = body.employee_id.as_deref().unwrap_or_default().trim().to_string();
    let date = body
        .date
        .as_deref()
        .and_then(|d| parse_date(d.trim()))
        .ok_or_else(|| AppError::Validation(vec!["Date is required".to_string()]))?;

    find_employee(pool.get_ref(), &employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    let existing = find_record(pool.get_ref(), &employee_id, date).await?;
    let mut record = existing
        .clone()
        .unwrap_or_else(|| AttendanceRecord::draft(&employee_id, date, now()));

    let check_in = body.check_in_time.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let check_out = body.check_out_time.as_deref().map(str::trim).filter(|t| !t.is_empty());

    if let Some(t) = check_in {
        record.check_in = Some(time_on(date, t, "check-in")?);
    }
    if let Some(t) = check_out {
        record.check_out = Some(time_on(date, t, "check-out")?);
    }
    ensure_ordered(&record)?;

    record.status = body.status.unwrap_or(AttendanceStatus::Present);
    record.notes = body.notes;

    if check_in.is_some() || check_out.is_some() {
        record = evaluate(&record, &config.policy);
    }

    let id = match existing {
        Some(_) => {
            update_record(pool.get_ref(), &record, Guard::Any).await?;
            record.id
        }
        None => insert_record(pool.get_ref(), &record).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::conflict("Attendance for this employee and date was recorded concurrently")
            } else {
                e.into()
            }
        })?,
    };

    info!(
        by = %auth.actor(),
        employee_id = %employee_id,
        date = %date,
        status = %record.status,
        "Manual attendance recorded"
    );

    let saved = reload(pool.get_ref(), id).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Manual attendance recorded successfully",
        "attendance": AttendanceResponse::from(&saved)
    })))
}

/// Edit an attendance record (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}",
    params(("attendance_id" = u64, Path, description = "Attendance record ID")),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Attendance updated", body = Object, example = json!({
            "message": "Attendance updated successfully"
        })),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<UpdateAttendance>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let attendance_id = path.into_inner();
    let body = body.into_inner();

    let mut record = find_record_by_id(pool.get_ref(), attendance_id)
        .await?
        .ok_or_else(|| AppError::not_found("Attendance record not found"))?;

    if let Some(t) = body.check_in_time.as_deref() {
        record.check_in = Some(time_on(record.date, t.trim(), "check-in")?);
    }
    if let Some(t) = body.check_out_time.as_deref() {
        record.check_out = Some(time_on(record.date, t.trim(), "check-out")?);
    }
    ensure_ordered(&record)?;

    if let Some(status) = body.status {
        record.status = status;
    }
    if let Some(notes) = body.notes {
        record.notes = Some(notes);
    }

    if body.check_in_time.is_some() || body.check_out_time.is_some() {
        record = evaluate(&record, &config.policy);
    } else if body.status.is_some() {
        warn!(attendance_id, status = %record.status, "Status overridden without time change");
    }

    update_record(pool.get_ref(), &record, Guard::Any).await?;

    info!(by = %auth.actor(), attendance_id, "Attendance updated");

    let saved = reload(pool.get_ref(), attendance_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance updated successfully",
        "attendance": AttendanceResponse::from(&saved)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn notes_are_appended_with_a_separator() {
        assert_eq!(
            append_note(Some("late bus".into()), Some("left early".into())).as_deref(),
            Some("late bus; left early")
        );
        assert_eq!(append_note(None, Some("left early".into())).as_deref(), Some("left early"));
        assert_eq!(append_note(Some("late bus".into()), None).as_deref(), Some("late bus"));
        assert_eq!(append_note(Some("late bus".into()), Some("  ".into())).as_deref(), Some("late bus"));
        assert_eq!(append_note(Some(String::new()), Some("x".into())).as_deref(), Some("x"));
    }

    #[test]
    fn times_are_placed_on_the_record_date() {
        let t = time_on(day(), "18:30:15", "check-out").unwrap();
        assert_eq!(t, day().and_hms_opt(18, 30, 15).unwrap());

        assert!(matches!(time_on(day(), "6pm", "check-out"), Err(AppError::Validation(_))));
    }

    #[test]
    fn inverted_records_are_rejected() {
        let mut record = AttendanceRecord::draft("E1", day(), day().and_hms_opt(8, 0, 0).unwrap());
        record.check_in = day().and_hms_opt(14, 0, 0);
        record.check_out = day().and_hms_opt(9, 0, 0);
        assert!(ensure_ordered(&record).is_err());

        record.check_out = day().and_hms_opt(18, 0, 0);
        assert!(ensure_ordered(&record).is_ok());

        record.check_in = None;
        assert!(ensure_ordered(&record).is_ok());
    }

    #[test]
    fn today_status_without_record() {
        let status = TodayStatus::from_record(None);

        assert!(!status.has_checked_in);
        assert!(!status.has_checked_out);
        assert_eq!(status.status, None);
    }

    #[test]
    fn today_status_reflects_the_record() {
        let mut record = AttendanceRecord::draft("E1", day(), day().and_hms_opt(8, 0, 0).unwrap());
        record.check_in = day().and_hms_opt(9, 12, 0);
        let record = evaluate(&record, &crate::engine::AttendancePolicy::default());

        let status = TodayStatus::from_record(Some(&record));

        assert!(status.has_checked_in);
        assert!(!status.has_checked_out);
        assert_eq!(status.check_in_time.as_deref(), Some("09:12:00"));
        assert_eq!(status.status, Some(AttendanceStatus::Late));
        assert_eq!(status.late_minutes, 12);
    }

    #[test]
    fn guards_restrict_the_update() {
        assert_eq!(Guard::Any.clause(), "");
        assert!(Guard::NotCheckedIn.clause().contains("check_in IS NULL"));
        assert!(Guard::NotCheckedOut.clause().contains("check_out IS NULL"));
    }
}
