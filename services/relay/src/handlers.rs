use crate::errors::RelayError;
use crate::services::IncrementRelay;
use actix_web::{http::StatusCode, web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check(relay: web::Data<Arc<IncrementRelay>>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "relay",
        "version": env!("CARGO_PKG_VERSION"),
        "upstream": relay.upstream().base_url(),
    }))
}

/// Validate and forward; the ledger service's status and body are returned unchanged
pub async fn increment(
    relay: web::Data<Arc<IncrementRelay>>,
    body: web::Bytes,
) -> Result<HttpResponse, RelayError> {
    let reply = relay.increment(&body).await?;

    let status = StatusCode::from_u16(reply.status).map_err(|_| {
        RelayError::UpstreamUnavailable(format!("invalid upstream status {}", reply.status))
    })?;

    Ok(HttpResponse::build(status)
        .content_type("application/json")
        .body(reply.body))
}

/// Prometheus scrape endpoint
pub async fn metrics_endpoint() -> Result<HttpResponse, RelayError> {
    let body = ledger_service::metrics::render(prometheus::default_registry())
        .map_err(|e| RelayError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics_endpoint))
        .service(web::scope("/api").route("/increment", web::post().to(increment)));
}
