//! Main entry point for the camper booking backend server.
//! This crate serves the booking REST API and the built marketing site.

mod config;

use actix_files::Files;
use actix_web::{App, HttpServer, middleware::Logger, web};
use booking_services::{BookingService, PgBookingStore};
use notification_services::{BookingNotifier, LogNotifier, SesNotifier};
use postgres::database::*;
use std::path::Path;
use std::sync::Arc;
use web_handlers::configure_api;

use config::{NotifierKind, ServerConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting camper booking server...");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Create database connection pool
    let pool = match create_connection_pool(&config.database_url, config.max_connections).await {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            log::error!("💡 Check DATABASE_URL and that PostgreSQL is running");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        log::error!("❌ Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let notifier: Arc<dyn BookingNotifier> = match &config.notifier {
        NotifierKind::Ses { from_email } => {
            log::info!("📧 Sending confirmations through AWS SES as {}", from_email);
            Arc::new(SesNotifier::new(from_email.clone()).await)
        }
        NotifierKind::Log => {
            log::warn!("🔧 NOTIFIER=log, confirmation emails are only logged");
            Arc::new(LogNotifier)
        }
    };
    let notifier = web::Data::from(notifier);

    let store = Arc::new(PgBookingStore::new(pool));
    let service = web::Data::new(BookingService::new(store, config.pricing));

    let static_dir = config
        .static_dir
        .clone()
        .filter(|dir| Path::new(dir).exists());
    match (&config.static_dir, &static_dir) {
        (_, Some(dir)) => log::info!("📁 Frontend files location: {}", dir),
        (Some(dir), None) => log::warn!("❌ Frontend files not found at {}", dir),
        (None, None) => log::info!("📁 No STATIC_DIR set, serving the API only"),
    }

    let bind = (config.bind_address.clone(), config.port);
    log::info!("🌐 Server will be available at: http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let app = App::new()
            .app_data(service.clone())
            .app_data(notifier.clone())
            .wrap(Logger::default())
            .configure(configure_api);

        match &static_dir {
            Some(dir) => app.service(Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind(bind)?
    .run()
    .await
}
