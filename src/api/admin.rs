use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{parse_status, SetStatusRequest, StatusFilter};
use super::extractors::AuthenticatedCaller;
use super::AppState;
use crate::actors::GetDlqMessages;
use crate::services::OrderServiceError;

const DEFAULT_DEAD_LETTER_LIMIT: usize = 50;

pub async fn list_all_orders(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    filter: web::Query<StatusFilter>,
) -> Result<HttpResponse, OrderServiceError> {
    let status = filter.status.as_deref().map(parse_status).transpose()?;
    let orders = state.services.status.list_all_orders(caller.0, status).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::set_status", skip_all, fields(user_id = %caller.user_id(), order_id = %order_id))]
pub async fn set_status(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    order_id: web::Path<Uuid>,
    body: web::Json<SetStatusRequest>,
) -> Result<HttpResponse, OrderServiceError> {
    let target = parse_status(&body.status)?;
    let order = state
        .services
        .status
        .set_status(order_id.into_inner(), caller.0, target)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeadLetterQuery {
    pub limit: Option<usize>,
}

pub async fn list_dead_letters(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    query: web::Query<DeadLetterQuery>,
) -> Result<HttpResponse, OrderServiceError> {
    if !caller.0.is_administrator() {
        return Err(OrderServiceError::NotAuthorized);
    }

    let limit = query.limit.unwrap_or(DEFAULT_DEAD_LETTER_LIMIT);
    let letters = state
        .dlq_actor
        .ask(GetDlqMessages { limit })
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read dead letters: {}", e))?;

    Ok(HttpResponse::Ok().json(letters))
}
