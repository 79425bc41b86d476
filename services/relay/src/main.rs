use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use ledger_service::telemetry;
use relay::{config::Config, handlers, metrics, IncrementRelay, LedgerClient};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    telemetry::init_tracing(Path::new(&config.logging.dir), "relay.log")
        .context("Failed to initialize logging")?;

    info!(
        "Relay started. N_MAX={}, APP_SERVER_URL={}",
        config.validation.n_max, config.upstream.base_url
    );

    metrics::register_metrics(prometheus::default_registry())
        .context("Failed to register metrics")?;

    let upstream = LedgerClient::new(
        config.upstream.base_url.clone(),
        config.upstream.timeout_secs,
    )?;
    let relay = web::Data::new(Arc::new(IncrementRelay::new(
        upstream,
        config.validation.n_max,
    )));

    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(relay.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    Ok(())
}
