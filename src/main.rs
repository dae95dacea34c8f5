use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod models;
mod report;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::routes::Limiters;
use crate::utils::{employee_code_cache, employee_code_filter};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance Tracker"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, "Server starting");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    let limiters = Limiters::from_config(&config)?;

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = employee_code_filter::warmup_employee_code_filter(&pool_for_filter_warmup, 100).await {
            warn!(error = %e, "Failed to warm up employee code filter");
        }
    });

    actix_web::rt::spawn(async move {
        // employees created in the last 30 days, 250 per batch
        if let Err(e) = employee_code_cache::warmup_employee_code_cache(&pool_for_cache_warmup, 30, 250).await {
            warn!(error = %e, "Failed to warm up employee code cache");
        }
    });

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        let config = config.clone();
        let limiters = limiters.clone();

        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard so the UI's JS/CSS assets resolve
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(move |cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
