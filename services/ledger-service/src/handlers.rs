use crate::errors::LedgerServiceError;
use crate::metrics;
use crate::services::LedgerService;
use crate::validation::ValidationFailure;
use actix_web::{error::PathError, web, HttpRequest, HttpResponse};
use serde_json::json;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check(
    service: web::Data<Arc<LedgerService>>,
) -> Result<HttpResponse, LedgerServiceError> {
    let records = service.record_count().await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "ledger-service",
        "version": env!("CARGO_PKG_VERSION"),
        "records": records,
        "n_max": service.n_max(),
    })))
}

/// Admit a number: `{"n": <integer>}` -> `{"result": n + 1}`
///
/// The body is taken raw so malformed JSON gets the ledger's own error body.
pub async fn process(
    service: web::Data<Arc<LedgerService>>,
    body: web::Bytes,
) -> Result<HttpResponse, LedgerServiceError> {
    let response = service.process_body(&body).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Look up a processed number
pub async fn get_number(
    service: web::Data<Arc<LedgerService>>,
    value: web::Path<i64>,
) -> Result<HttpResponse, LedgerServiceError> {
    let record = service.lookup(*value).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Prometheus scrape endpoint
pub async fn metrics_endpoint() -> Result<HttpResponse, LedgerServiceError> {
    let body = metrics::render(prometheus::default_registry())
        .map_err(|e| LedgerServiceError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

/// Answer unparseable path segments with the ledger's JSON error body
fn path_error(err: PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected path segment");
    LedgerServiceError::from(ValidationFailure::InvalidPathValue).into()
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(path_error))
        .route("/health", web::get().to(health_check))
        .route("/process", web::post().to(process))
        .route("/numbers/{value}", web::get().to(get_number))
        .route("/metrics", web::get().to(metrics_endpoint));
}
