use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod attendance;
mod config;
mod db;
mod docs;
mod jobs;
mod model;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::attendance::notify::{self, LogDispatch};
use crate::docs::ApiDoc;
use crate::utils::profile_cache;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance engine up"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Attendance engine starting...");

    let pool = init_db(&config.database_url).await;

    // Late-status facts flow from the punch path to the escalation
    // consumer over this channel; the write path never waits on email.
    let (late_tx, late_rx) = mpsc::channel(config.late_event_buffer);

    let pool_for_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = profile_cache::warmup_profile_cache(&pool_for_warmup, 250).await {
            eprintln!("Failed to warmup profile cache: {:?}", e);
        }
    });

    let pool_for_notify = pool.clone();
    let late_threshold = config.late_warn_threshold;
    actix_web::rt::spawn(async move {
        notify::run_consumer(pool_for_notify, late_rx, Arc::new(LogDispatch), late_threshold).await;
    });

    let pool_for_nightly = pool.clone();
    let nightly_tx = late_tx.clone();
    let policy_tz = config.policy_timezone;
    let nightly_run_time = config.nightly_run_time;
    actix_web::rt::spawn(async move {
        jobs::nightly::run_scheduler(pool_for_nightly, nightly_tx, policy_tz, nightly_run_time)
            .await;
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(late_tx.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
