//! Rentora Backend Server
//!
//! Booking core for the multi-tenant car rental marketplace: conflict-safe
//! booking creation, deterministic pricing, and payment reconciliation
//! against the external provider.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use rentora_api::{configure_bookings, configure_payments};
use rentora_core::config::AppConfig;
use rentora_db::{
    create_pool, pool::run_migrations, PgBookingRepository, PgPaymentRepository,
    PgVehicleRepository,
};
use rentora_services::{BookingService, HttpPaymentGateway, ReconciliationService};
use std::env;
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "rentora-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Configure API routes
fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(configure_bookings)
            .configure(configure_payments),
    );
}

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rentora_backend={},rentora_api={},rentora_services={},rentora_db={},actix_web=info,sqlx=warn",
            log_level, log_level, log_level, log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

fn to_io_error<E: std::fmt::Display>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Rentora Backend v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().map_err(to_io_error)?;

    info!("Connecting to database...");
    let pool = create_pool(&config.database.url, Some(config.database.max_connections))
        .await
        .map_err(to_io_error)?;

    run_migrations(&pool).await.map_err(to_io_error)?;

    // Wire repositories and services
    let vehicles = Arc::new(PgVehicleRepository::new(pool.clone()));
    let bookings = Arc::new(PgBookingRepository::new(pool.clone()));
    let payments = Arc::new(PgPaymentRepository::new(pool.clone()));

    let booking_service = Arc::new(BookingService::new(
        vehicles,
        bookings,
        config.booking.max_advance_days,
    ));

    let gateway = Arc::new(HttpPaymentGateway::new(&config.provider).map_err(to_io_error)?);

    let reconciliation_service = Arc::new(
        ReconciliationService::new(
            payments,
            gateway,
            booking_service.clone(),
            &config.provider,
            &config.booking,
        )
        .map_err(to_io_error)?,
    );

    let booking_data = web::Data::from(booking_service);
    let reconciliation_data = web::Data::from(reconciliation_service);

    // CORS configuration
    let cors_origins = env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origins: Vec<&str> = cors_origins_inner.split(',').collect();
                if let Ok(origin_str) = origin.to_str() {
                    origins.iter().any(|o| o.trim() == origin_str)
                } else {
                    false
                }
            })
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(booking_data.clone())
            .app_data(reconciliation_data.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_body",
                        "message": error_message
                    })),
                )
                .into()
            }))
            .wrap(cors)
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
