use actix_web::{web, HttpResponse, Responder};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

use super::Metrics;

/// Render every registered metric in the Prometheus text format
pub fn encode_text(registry: &Registry) -> anyhow::Result<Vec<u8>> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(buffer)
}

/// Mount `/metrics` on the API server; expects `web::Data<Arc<Metrics>>`
pub fn configure_metrics_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler));
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    match encode_text(metrics.registry()) {
        Ok(buffer) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buffer),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
