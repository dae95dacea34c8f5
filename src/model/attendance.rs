use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    #[serde(rename = "Half-day")]
    #[strum(serialize = "Half-day")]
    HalfDay,
    Leave,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub late_minutes: i32,
    pub overtime_minutes: i32,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AttendanceRecord {
    /// A record that has not been stored yet.
    pub fn draft(employee_id: &str, date: NaiveDate, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            employee_id: employee_id.to_string(),
            date,
            check_in: None,
            check_out: None,
            status: AttendanceStatus::Present,
            late_minutes: 0,
            overtime_minutes: 0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 42,
    "employee_id": "EMP-001",
    "date": "2026-03-10",
    "check_in": "09:12:04",
    "check_out": "18:30:00",
    "status": "Late",
    "late_minutes": 12,
    "overtime_minutes": 0,
    "notes": null,
    "created_at": "2026-03-10 09:12:04",
    "updated_at": "2026-03-10 18:30:00"
}))]
pub struct AttendanceResponse {
    pub id: u64,
    pub employee_id: String,
    pub date: String,
    /// Time of day, `HH:MM:SS`
    pub check_in: Option<String>,
    /// Time of day, `HH:MM:SS`
    pub check_out: Option<String>,
    pub status: AttendanceStatus,
    pub late_minutes: i32,
    pub overtime_minutes: i32,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&AttendanceRecord> for AttendanceResponse {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            id: record.id,
            employee_id: record.employee_id.clone(),
            date: record.date.format(DATE_FORMAT).to_string(),
            check_in: record.check_in.map(|t| t.format(TIME_FORMAT).to_string()),
            check_out: record.check_out.map(|t| t.format(TIME_FORMAT).to_string()),
            status: record.status,
            late_minutes: record.late_minutes,
            overtime_minutes: record.overtime_minutes,
            notes: record.notes.clone(),
            created_at: record.created_at.format(DATE_TIME_FORMAT).to_string(),
            updated_at: record.updated_at.format(DATE_TIME_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_display_names() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "Half-day");
        assert_eq!(AttendanceStatus::Late.as_ref(), "Late");
        assert_eq!("Half-day".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::HalfDay);
        assert_eq!(
            AttendanceStatus::try_from("Leave".to_string()).unwrap(),
            AttendanceStatus::Leave
        );
        assert!("half_day".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn status_serializes_like_the_database() {
        let json = serde_json::to_string(&AttendanceStatus::HalfDay).unwrap();
        assert_eq!(json, "\"Half-day\"");

        let parsed: AttendanceStatus = serde_json::from_str("\"Absent\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::Absent);
    }

    #[test]
    fn response_formats_times_of_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut record = AttendanceRecord::draft("EMP-7", date, date.and_hms_opt(9, 5, 3).unwrap());
        record.check_in = date.and_hms_opt(9, 5, 3);

        let response = AttendanceResponse::from(&record);

        assert_eq!(response.date, "2026-03-10");
        assert_eq!(response.check_in.as_deref(), Some("09:05:03"));
        assert_eq!(response.check_out, None);
        assert_eq!(response.created_at, "2026-03-10 09:05:03");
    }
}
