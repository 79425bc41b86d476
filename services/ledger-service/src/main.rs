use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use ledger_service::{config::Config, handlers, metrics, telemetry, Database, LedgerService};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    telemetry::init_tracing(Path::new(&config.logging.dir), "ledger_service.log")
        .context("Failed to initialize logging")?;

    info!(
        "Starting Ledger Service. DB_PATH={} N_MAX={}",
        config.database.path, config.ledger.n_max
    );

    metrics::register_metrics(prometheus::default_registry())
        .context("Failed to register metrics")?;

    // Open the ledger; the schema bootstrap runs on every start
    let db = Arc::new(
        Database::connect(&config.database)
            .await
            .context("Failed to open ledger database")?,
    );

    let service = Arc::new(LedgerService::new(db.clone(), config.ledger.n_max));
    let records = service.record_count().await.context("Failed to read ledger")?;
    info!(records, "Ledger service initialized");

    let server_config = config.server.clone();
    let service_data = web::Data::new(service);

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service_data.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    db.close().await;
    info!("Ledger service stopped");
    Ok(())
}
