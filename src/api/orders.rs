use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CancelRequest, CheckoutRequest, PaymentProofRequest};
use super::extractors::AuthenticatedCaller;
use super::AppState;
use crate::services::OrderServiceError;

#[instrument(name = "handler::checkout", skip_all, fields(user_id = %caller.user_id()))]
pub async fn checkout(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, OrderServiceError> {
    let body = body.into_inner();
    let order = state
        .services
        .checkout
        .checkout(caller.user_id(), body.delivery.into(), body.payment_method)
        .await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn list_orders(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
) -> Result<HttpResponse, OrderServiceError> {
    let orders = state.services.status.list_orders(caller.0).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn get_order(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    order_id: web::Path<Uuid>,
) -> Result<HttpResponse, OrderServiceError> {
    let order = state.services.status.get_order(order_id.into_inner(), caller.0).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::cancel", skip_all, fields(user_id = %caller.user_id(), order_id = %order_id))]
pub async fn cancel(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    order_id: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse, OrderServiceError> {
    let request = CancelRequest::from_body(&body)?;
    let order = state
        .services
        .status
        .cancel(order_id.into_inner(), caller.0, request.reason)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::payment_proof", skip_all, fields(user_id = %caller.user_id(), order_id = %order_id))]
pub async fn submit_payment_proof(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    order_id: web::Path<Uuid>,
    body: web::Json<PaymentProofRequest>,
) -> Result<HttpResponse, OrderServiceError> {
    let body = body.into_inner();
    let order = state
        .services
        .payments
        .submit_payment_proof(
            order_id.into_inner(),
            caller.0,
            body.artifact_ref.unwrap_or_default(),
            body.external_transaction_ref,
        )
        .await?;
    Ok(HttpResponse::Ok().json(order))
}
