use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::attendance::{DATE_FORMAT, DATE_TIME_FORMAT};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: u64,
    pub employee_id: String,
    pub name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub role_id: u8,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "EMP-001",
        "name": "John Doe",
        "department": "Engineering",
        "position": "Software Engineer",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "hire_date": "2024-01-01",
        "role_id": 3,
        "is_active": true,
        "created_at": "2024-01-01 10:00:00",
        "updated_at": "2024-01-01 10:00:00"
    })
)]
pub struct EmployeeResponse {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Software Engineer", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "john.doe@company.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "2024-01-01", format = "date", nullable = true)]
    pub hire_date: Option<String>,

    #[schema(example = 3)]
    pub role_id: u8,

    #[schema(example = true)]
    pub is_active: bool,

    #[schema(example = "2024-01-01 10:00:00")]
    pub created_at: String,

    #[schema(example = "2024-01-01 10:00:00")]
    pub updated_at: String,
}

impl From<&Employee> for EmployeeResponse {
    fn from(e: &Employee) -> Self {
        Self {
            id: e.id,
            employee_id: e.employee_id.clone(),
            name: e.name.clone(),
            department: e.department.clone(),
            position: e.position.clone(),
            email: e.email.clone(),
            phone: e.phone.clone(),
            hire_date: e.hire_date.map(|d| d.format(DATE_FORMAT).to_string()),
            role_id: e.role_id,
            is_active: e.is_active,
            created_at: e.created_at.format(DATE_TIME_FORMAT).to_string(),
            updated_at: e.updated_at.format(DATE_TIME_FORMAT).to_string(),
        }
    }
}
