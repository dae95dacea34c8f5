use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::models::TokenType;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

fn reject(req: ServiceRequest, body: serde_json::Value) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(body);
    req.into_response(resp.map_into_boxed_body())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h.to_str().map_err(|_| {
            actix_web::error::ErrorUnauthorized(
                json!({"message": "Invalid Authorization header encoding"}),
            )
        })?,
        None => {
            return Ok(reject(req, json!({"message": "Missing Authorization header"})));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t.to_string(),
        None => {
            return Ok(reject(
                req,
                json!({"message": "Authorization header must start with Bearer"}),
            ));
        }
    };

    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            return Ok(reject(
                req,
                json!({"message": "Invalid or expired token", "details": e}),
            ));
        }
    };

    if claims.token_type != TokenType::Access {
        return Ok(reject(req, json!({"message": "Access token required"})));
    }

    let role = match Role::from_id(claims.role) {
        Some(role) => role,
        None => return Ok(reject(req, json!({"message": "Invalid role"}))),
    };

    let auth_user = AuthUser {
        employee_id: claims.sub,
        name: claims.name,
        role,
    };

    tracing::debug!(employee_id = %auth_user.employee_id, role = %auth_user.role, "Authenticated request");
    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::{App, test, web};

    async fn whoami(auth: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(auth.employee_id)
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new().app_data(Data::new(Config::for_tests())).service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .route("/whoami", web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/whoami").to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", "Basic abc"))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn refresh_token_cannot_call_the_api() {
        let app = app!();
        let (token, _) = generate_refresh_token("EMP-001", "Jane", 3, "test-secret", 60).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_access_token_reaches_the_handler() {
        let app = app!();
        let token = generate_access_token("EMP-001", "Jane", 3, "test-secret", 60).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "EMP-001");
    }
}
