use crate::api::attendance::{
    CheckInOut, HistoryResponse, ManualAttendance, TodayStatus, UpdateAttendance,
};
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::auth::handlers::{LoginResponse, TokenPair};
use crate::model::attendance::{AttendanceResponse, AttendanceStatus};
use crate::model::employee::EmployeeResponse;
use crate::models::LoginReqDto;
use crate::report::daily::{DailyReport, DailyReportRow};
use crate::report::monthly::{EmployeeSummary, MonthlyReport, Period, SummaryStatistics};
use crate::report::statistics::{
    AttendanceStatistics, DailyStatistics, OverallStatistics, StatisticsPeriod,
};
use crate::utils::pagination::PageInfo;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Daily check-in and check-out with automatic classification of each day.

### Key Features
- **Attendance**
  - Check-in / check-out, today's state, history, manual entries and corrections
- **Classification**
  - `Present` until 09:00, `Late` up to 30 minutes after, `Half-day` beyond
  - Worked time excludes the 12:00-13:00 lunch break; overtime counts past 9 hours
- **Employees**
  - Create, update, list, activate and deactivate employee records
- **Reports**
  - Daily, monthly, per-employee summary, statistics, CSV and Excel export

### Security
Endpoints under `/api` require a **JWT Bearer** access token.
Employees act on their own records; **HR** and **Admin** may act on anyone's.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::profile,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today_status,
        crate::api::attendance::history,
        crate::api::attendance::manual_attendance,
        crate::api::attendance::update_attendance,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::activate_employee,
        crate::api::employee::deactivate_employee,

        crate::api::report::daily_report,
        crate::api::report::monthly_report,
        crate::api::report::employee_summary,
        crate::api::report::statistics,
        crate::api::report::export_daily
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            TokenPair,
            AttendanceStatus,
            AttendanceResponse,
            CheckInOut,
            ManualAttendance,
            UpdateAttendance,
            TodayStatus,
            HistoryResponse,
            PageInfo,
            CreateEmployee,
            EmployeeResponse,
            EmployeeListResponse,
            DailyReport,
            DailyReportRow,
            MonthlyReport,
            Period,
            SummaryStatistics,
            EmployeeSummary,
            AttendanceStatistics,
            DailyStatistics,
            OverallStatistics,
            StatisticsPeriod
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token management"),
        (name = "Attendance", description = "Attendance tracking APIs"),
        (name = "Employees", description = "Employee management APIs"),
        (name = "Reports", description = "Attendance reports and exports"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();

        for path in [
            "/auth/login",
            "/api/attendance/check-in",
            "/api/attendance/{attendance_id}",
            "/api/employees/{employee_id}/activate",
            "/api/reports/export/daily",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");

        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
