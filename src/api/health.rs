use actix_web::{web, HttpResponse};
use serde_json::json;

use super::AppState;
use crate::actors::{GetSystemHealth, HealthStatus};

/// 200 while healthy or degraded, 503 once any component is unhealthy
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.health_monitor.ask(GetSystemHealth).send().await {
        Ok(health) => {
            let mut response = match health.overall_status {
                HealthStatus::Unhealthy(_) => HttpResponse::ServiceUnavailable(),
                _ => HttpResponse::Ok(),
            };
            response.json(health)
        }
        Err(e) => {
            tracing::error!(error = %e, "Health monitor unavailable");
            HttpResponse::ServiceUnavailable().json(json!({
                "overall_status": {"state": "unhealthy", "reason": "health monitor unavailable"},
            }))
        }
    }
}
