use crate::{
    auth::auth::AuthUser,
    error::{AppError, is_duplicate_key},
    model::{employee::{Employee, EmployeeResponse}, role::Role},
    utils::{
        db_utils::{SqlValue, build_update_sql, execute_update},
        employee_code_cache, employee_code_filter,
        pagination::{Page, PageInfo},
        validators::{EmployeeInput, parse_date, validate_email, validate_employee, validate_phone},
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

pub(crate) const EMPLOYEE_COLUMNS: &str = "id, employee_id, name, department, position, email, phone, \
     hire_date, role_id, is_active, created_at, updated_at";

const UPDATABLE_COLUMNS: &[&str] = &["name", "department", "position", "email", "phone", "is_active", "role_id"];

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_id: Option<String>,
    #[schema(example = "John Doe")]
    pub name: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "Software Engineer")]
    pub position: Option<String>,
    #[schema(example = "john@email.com", format = "email")]
    pub email: Option<String>,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = "2026-01-01", format = "date")]
    pub hire_date: Option<String>,
    /// 1 = admin, 2 = hr, 3 = employee
    #[schema(example = 3)]
    pub role_id: Option<u8>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Defaults to true
    pub active_only: Option<bool>,
    pub department: Option<String>,
    /// Matches code, name, email or department
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub employees: Vec<EmployeeResponse>,
    #[serde(flatten)]
    pub pagination: PageInfo,
}

pub async fn find_employee(pool: &MySqlPool, employee_id: &str) -> Result<Option<Employee>, sqlx::Error> {
    let sql = format!("SELECT {} FROM employees WHERE employee_id = ?", EMPLOYEE_COLUMNS);

    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await
}

/// filter (definitely free) -> cache (definitely taken) -> database
#[instrument(level = "debug", skip(pool))]
async fn is_code_taken(pool: &MySqlPool, employee_id: &str) -> Result<bool, sqlx::Error> {
    if !employee_code_filter::might_exist(employee_id) {
        return Ok(false);
    }
    if employee_code_cache::is_taken(employee_id).await {
        return Ok(true);
    }

    let taken = find_employee(pool, employee_id).await?.is_some();
    if taken {
        employee_code_cache::mark_taken(employee_id).await;
    }
    Ok(taken)
}

/// Rejects malformed values among the keys that will be written.
fn validate_update(payload: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(obj) = payload.as_object() else {
        return errors;
    };

    if let Some(name) = obj.get("name") {
        if name.as_str().map(str::trim).is_none_or(str::is_empty) {
            errors.push("Name cannot be empty".to_string());
        }
    }
    if let Some(Value::String(email)) = obj.get("email") {
        if !email.is_empty() && !validate_email(email) {
            errors.push("Invalid email format".to_string());
        }
    }
    if let Some(Value::String(phone)) = obj.get("phone") {
        if !phone.is_empty() && !validate_phone(phone) {
            errors.push("Invalid phone number format".to_string());
        }
    }
    if let Some(role) = obj.get("role_id") {
        let valid = role
            .as_u64()
            .and_then(|id| u8::try_from(id).ok())
            .and_then(Role::from_id)
            .is_some();
        if !valid {
            errors.push("Invalid role".to_string());
        }
    }
    if let Some(active) = obj.get("is_active") {
        if !active.is_boolean() {
            errors.push("is_active must be a boolean".to_string());
        }
    }

    errors
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let page = Page::new(query.page, query.per_page, 20, 100);

    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if query.active_only.unwrap_or(true) {
        conditions.push("is_active = TRUE");
    }

    if let Some(department) = query.department.as_deref().filter(|d| !d.is_empty()) {
        conditions.push("department = ?");
        bindings.push(department.to_string());
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("(employee_id LIKE ? OR name LIKE ? OR email LIKE ? OR department LIKE ?)");
        let like = format!("%{}%", search);
        bindings.extend(std::iter::repeat_n(like, 4));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {} FROM employees {} ORDER BY name ASC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_clause
    );
    debug!(sql = %data_sql, page = page.page, per_page = page.per_page, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    let employees = data_query
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        employees: employees.iter().map(EmployeeResponse::from).collect(),
        pagination: page.info(total),
    }))
}

/// Get employee by code
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeResponse),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let employee = find_employee(pool.get_ref(), &path)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(EmployeeResponse::from(&employee)))
}

/// Create employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created successfully"
        })),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "errors": ["Name is required"]
        })),
        (status = 409, description = "Employee code or email already exists")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let payload = payload.into_inner();

    let mut errors = validate_employee(&EmployeeInput {
        employee_id: payload.employee_id.as_deref(),
        name: payload.name.as_deref(),
        email: payload.email.as_deref(),
        phone: payload.phone.as_deref(),
        hire_date: payload.hire_date.as_deref(),
    });
    if payload.role_id.is_some_and(|id| Role::from_id(id).is_none()) {
        errors.push("Invalid role".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let code = payload.employee_id.as_deref().unwrap_or_default().trim().to_string();
    let name = payload.name.as_deref().unwrap_or_default().trim().to_string();
    let hire_date = payload.hire_date.as_deref().and_then(|d| parse_date(d.trim()));
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    if is_code_taken(pool.get_ref(), &code).await? {
        return Err(AppError::conflict("Employee ID already exists"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (employee_id, name, department, position, email, phone, hire_date, role_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&code)
    .bind(&name)
    .bind(non_empty(payload.department))
    .bind(non_empty(payload.position))
    .bind(non_empty(payload.email))
    .bind(non_empty(payload.phone))
    .bind(hire_date)
    .bind(payload.role_id.unwrap_or(Role::Employee.id()))
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_duplicate_key(&e) => {
            return Err(AppError::conflict("Employee ID or email already exists"));
        }
        Err(e) => return Err(e.into()),
    }

    employee_code_filter::insert(&code);
    employee_code_cache::mark_taken(&code).await;

    info!(by = %auth.actor(), employee_id = %code, "Employee created");

    let employee = find_employee(pool.get_ref(), &code)
        .await?
        .ok_or(AppError::Internal)?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "employee": EmployeeResponse::from(&employee)
    })))
}

/// Update employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee code")),
    request_body(content = Object, description = "Any of name, department, position, email, phone, is_active, role_id"),
    responses(
        (status = 200, description = "Employee updated", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Unknown field or invalid value"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let code = path.into_inner();

    let errors = validate_update(&body);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    find_employee(pool.get_ref(), &code)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    let update = build_update_sql(
        "employees",
        &body,
        UPDATABLE_COLUMNS,
        "employee_id",
        SqlValue::String(code.clone()),
    )?;

    match execute_update(pool.get_ref(), update).await {
        Ok(_) => {}
        Err(e) if is_duplicate_key(&e) => return Err(AppError::conflict("Email already exists")),
        Err(e) => return Err(e.into()),
    }

    info!(by = %auth.actor(), employee_id = %code, "Employee updated");

    let employee = find_employee(pool.get_ref(), &code)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully",
        "employee": EmployeeResponse::from(&employee)
    })))
}

/// Delete employee and their attendance
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Employee deleted", body = Object, example = json!({
            "message": "Employee deleted successfully"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let code = path.into_inner();

    let result = sqlx::query("DELETE FROM employees WHERE employee_id = ?")
        .bind(&code)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Employee not found"));
    }

    employee_code_filter::remove(&code);
    employee_code_cache::forget(&code).await;

    info!(by = %auth.actor(), employee_id = %code, "Employee deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully"
    })))
}

async fn set_active(pool: &MySqlPool, code: &str, active: bool) -> Result<(), AppError> {
    find_employee(pool, code)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    sqlx::query("UPDATE employees SET is_active = ? WHERE employee_id = ?")
        .bind(active)
        .bind(code)
        .execute(pool)
        .await?;

    Ok(())
}

/// Activate employee
#[utoipa::path(
    post,
    path = "/api/employees/{employee_id}/activate",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Employee activated", body = Object, example = json!({
            "message": "Employee activated successfully"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn activate_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    set_active(pool.get_ref(), &path, true).await?;

    info!(by = %auth.actor(), employee_id = %path, "Employee activated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee activated successfully"
    })))
}

/// Deactivate employee
#[utoipa::path(
    post,
    path = "/api/employees/{employee_id}/deactivate",
    params(("employee_id" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Employee deactivated", body = Object, example = json!({
            "message": "Employee deactivated successfully"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    set_active(pool.get_ref(), &path, false).await?;

    info!(by = %auth.actor(), employee_id = %path, "Employee deactivated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deactivated successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_accepts_valid_fields() {
        let payload = json!({
            "name": "Jane",
            "email": "jane@example.com",
            "phone": "+8801712345678",
            "role_id": 2,
            "is_active": false
        });

        assert!(validate_update(&payload).is_empty());
    }

    #[test]
    fn update_reports_each_bad_field() {
        let payload = json!({
            "name": "  ",
            "email": "not-an-email",
            "role_id": 9,
            "is_active": "yes"
        });

        let errors = validate_update(&payload);

        assert_eq!(
            errors,
            vec![
                "Name cannot be empty",
                "Invalid email format",
                "Invalid role",
                "is_active must be a boolean",
            ]
        );
    }

    #[test]
    fn clearing_optional_contact_fields_is_allowed() {
        assert!(validate_update(&json!({ "email": "", "phone": null })).is_empty());
    }

    #[test]
    fn employee_id_is_not_updatable() {
        let err = build_update_sql(
            "employees",
            &json!({ "employee_id": "NEW" }),
            UPDATABLE_COLUMNS,
            "employee_id",
            SqlValue::String("OLD".into()),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
