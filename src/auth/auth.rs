use crate::config::Config;
use crate::error::AppError;
use crate::models::TokenType;
use crate::{auth::jwt::verify_token, model::role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    /// employee code the token was issued for
    pub employee_id: String,
    pub name: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected routes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        ready(authenticate(req).map_err(Into::into))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let config = req.app_data::<Data<Config>>().ok_or_else(|| {
        tracing::error!("Config missing from app data");
        AppError::Internal
    })?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized("Access token required".into()));
    }

    let role = Role::from_id(claims.role).ok_or_else(|| AppError::Unauthorized("Invalid role".into()))?;

    Ok(AuthUser {
        employee_id: claims.sub,
        name: claims.name,
        role,
    })
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.is_hr_or_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("HR/Admin only"))
        }
    }

    /// `Name (CODE)`, for audit log lines.
    pub fn actor(&self) -> String {
        format!("{} ({})", self.name, self.employee_id)
    }

    pub fn is_hr_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hr)
    }

    /// The employee a request acts on: the caller by default; someone else
    /// only for HR/Admin.
    pub fn resolve_employee(&self, requested: Option<&str>) -> Result<String, AppError> {
        match requested.map(str::trim).filter(|c| !c.is_empty()) {
            None => Ok(self.employee_id.clone()),
            Some(code) if code == self.employee_id => Ok(code.to_string()),
            Some(code) => {
                self.require_hr_or_admin()?;
                Ok(code.to_string())
            }
        }
    }
}
