use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
    },
    config::Config,
    error::AppError,
    model::employee::{Employee, EmployeeResponse},
    models::{Claims, LoginReqDto, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub employee: EmployeeResponse,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    error!(error = %e, "Failed to sign token");
    AppError::Internal
}

/// Issue an access/refresh pair and persist the refresh token's jti.
async fn issue_tokens(
    pool: &MySqlPool,
    config: &Config,
    employee_id: &str,
    name: &str,
    role: u8,
) -> Result<TokenPair, AppError> {
    let access_token = generate_access_token(
        employee_id,
        name,
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(token_error)?;

    let (refresh_token, refresh_claims): (String, Claims) = generate_refresh_token(
        employee_id,
        name,
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(token_error)?;

    debug!(jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (employee_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(employee_id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Log in with an employee code
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Employee ID is required"),
        (status = 403, description = "Employee account is inactive"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, payload), fields(employee_id = %payload.employee_id))]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    let code = payload.employee_id.trim();
    if code.is_empty() {
        return Err(AppError::bad_request("Employee ID is required"));
    }

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_id = ?")
        .bind(code)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| {
            info!("Login rejected: employee not found");
            AppError::not_found("Employee not found")
        })?;

    if !employee.is_active {
        info!("Login rejected: employee inactive");
        return Err(AppError::forbidden("Employee account is inactive"));
    }

    let tokens = issue_tokens(
        pool.get_ref(),
        &config,
        &employee.employee_id,
        &employee.name,
        employee.role_id,
    )
    .await?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        employee: EmployeeResponse::from(&employee),
    }))
}

/// Current employee's profile
#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, body = EmployeeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn profile(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, AppError> {
    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_id = ?")
        .bind(&auth.employee_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(EmployeeResponse::from(&employee)))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let unauthorized = || AppError::Unauthorized("Invalid refresh token".into());

    let token = bearer(&req).ok_or_else(unauthorized)?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| unauthorized())?;

    if claims.token_type != TokenType::Refresh {
        return Err(unauthorized());
    }

    // revoke the old token; zero rows means unknown or already revoked
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE jti = ? AND revoked = FALSE AND expires_at > NOW()
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await?;

    if revoked.rows_affected() == 0 {
        info!(jti = %claims.jti, "Refresh rejected: token revoked or unknown");
        return Err(unauthorized());
    }

    // role and active flag may have changed since the token was issued
    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_id = ?")
        .bind(&claims.sub)
        .fetch_optional(pool.get_ref())
        .await?
        .filter(|e| e.is_active)
        .ok_or_else(unauthorized)?;

    let tokens = issue_tokens(
        pool.get_ref(),
        &config,
        &employee.employee_id,
        &employee.name,
        employee.role_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(tokens))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}
