use crate::{
    api::{attendance, employee, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

fn build_limiter(name: &str, requests_per_min: u32) -> Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .with_context(|| format!("Invalid {} rate limit: {} per minute", name, requests_per_min))?;

    Ok(Arc::new(Governor::new(&cfg)))
}

/// Shared by every worker so limits hold per process, not per thread.
#[derive(Clone)]
pub struct Limiters {
    login: Limiter,
    refresh: Limiter,
    protected: Limiter,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter("login", config.rate_login_per_min)?,
            refresh: build_limiter("refresh", config.rate_refresh_per_min)?,
            protected: build_limiter("protected", config.rate_protected_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    // Public routes; profile authenticates through the AuthUser extractor
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/profile")
                    .wrap(limiters.protected.clone())
                    .route(web::get().to(handlers::profile)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiters.protected.clone())
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    .service(
                        web::resource("/{employee_id}/activate")
                            .route(web::post().to(employee::activate_employee)),
                    )
                    .service(
                        web::resource("/{employee_id}/deactivate")
                            .route(web::post().to(employee::deactivate_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
                    .service(
                        web::resource("/status/today").route(web::get().to(attendance::today_status)),
                    )
                    .service(
                        web::resource("/history/{employee_id}")
                            .route(web::get().to(attendance::history)),
                    )
                    .service(
                        web::resource("/manual").route(web::post().to(attendance::manual_attendance)),
                    )
                    // keep last: matches any single segment
                    .service(
                        web::resource("/{attendance_id}")
                            .route(web::put().to(attendance::update_attendance)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/daily").route(web::get().to(report::daily_report)))
                    .service(web::resource("/monthly").route(web::get().to(report::monthly_report)))
                    .service(
                        web::resource("/employee-summary/{employee_id}")
                            .route(web::get().to(report::employee_summary)),
                    )
                    .service(web::resource("/statistics").route(web::get().to(report::statistics)))
                    .service(
                        web::resource("/export/daily").route(web::get().to(report::export_daily)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + refresh_token

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::model::role::Role;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use sqlx::mysql::MySqlPoolOptions;

    #[actix_web::test]
    async fn limiters_reject_zero_rates() {
        assert!(build_limiter("login", 0).is_err());
        assert!(build_limiter("login", 60).is_ok());
    }

    #[actix_web::test]
    async fn protected_scope_requires_a_token() {
        let config = Config::for_tests();
        let limiters = Limiters::from_config(&config).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(Data::new(config.clone()))
                .configure(|cfg| configure(cfg, &config, &limiters)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/reports/daily")
            .peer_addr("127.0.0.1:9000".parse().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn employees_are_kept_out_of_reports() {
        let config = Config::for_tests();
        let limiters = Limiters::from_config(&config).unwrap();
        let token = generate_access_token(
            "EMP-001",
            "Ann",
            Role::Employee.id(),
            &config.jwt_secret,
            config.access_token_ttl,
        )
        .unwrap();

        // never connects; the role check rejects before any query
        let pool = MySqlPoolOptions::new().connect_lazy(&config.database_url).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(Data::new(config.clone()))
                .app_data(Data::new(pool))
                .configure(|cfg| configure(cfg, &config, &limiters)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/reports/export/daily?format=xlsx")
            .peer_addr("127.0.0.1:9000".parse().unwrap())
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
