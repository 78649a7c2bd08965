use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::watch;

mod api;
mod attendance;
mod config;
mod db;
mod device;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod store;
mod utils;

#[cfg(test)]
mod testing;

use attendance::clock::{Clock, OffsetClock};
use attendance::scheduler::DailyRollupScheduler;
use attendance::service::AttendanceService;
use config::Config;
use db::init_db;
use device::client::DigestAuthClient;
use device::hikvision::HikvisionGateway;
use device::tls;
use store::mysql::MySqlStore;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let store = Arc::new(MySqlStore::new(pool));

    let client = DigestAuthClient::new(
        &config.device_scheme,
        config.device_timeout,
        config.device_probe_timeout,
    )
    .context("Failed to build device HTTP client")?
    .with_policy(if config.device_accept_private_certs {
        tls::private_network_only
    } else {
        tls::always_verify
    });
    let gateway = Arc::new(HikvisionGateway::new(client, config.acs_max_results));
    let clock: Arc<dyn Clock> = Arc::new(OffsetClock::new(config.attendance_offset));

    let service = AttendanceService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        gateway,
        clock.clone(),
        config.attendance_offset,
        config.device_query_concurrency,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Arc::new(DailyRollupScheduler::new(
        service.clone(),
        store.clone(),
        store,
        config.schedule,
        config.rollup_interval,
        clock,
        shutdown_rx,
    ));

    let rollup_task = if config.rollup_enabled {
        Some(actix_web::rt::spawn(scheduler.clone().run()))
    } else {
        warn!("Daily rollup disabled, ledger is only written on manual runs");
        None
    };

    let limiter = Arc::new(routes::build_limiter(config.rate_attendance_per_min)?);
    let api_prefix = config.api_prefix.clone();
    let server_addr = config.server_addr.clone();

    log::info!("Listening on {}", server_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(service.clone()))
            .app_data(Data::new(scheduler.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, &api_prefix, limiter.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    info!("Server stopped, shutting down rollup scheduler");
    shutdown_tx.send(true).ok();
    if let Some(task) = rollup_task {
        task.await.ok();
    }

    Ok(())
}
