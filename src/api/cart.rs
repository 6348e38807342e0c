use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::dto::{AddCartItemRequest, UpdateCartItemRequest};
use super::extractors::AuthenticatedCaller;
use super::AppState;
use crate::services::OrderServiceError;

pub async fn get_cart(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
) -> Result<HttpResponse, OrderServiceError> {
    let cart = state.services.carts.get_cart(caller.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub async fn add_item(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    body: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse, OrderServiceError> {
    let body = body.into_inner();
    let cart = state
        .services
        .carts
        .add_item(caller.user_id(), body.product_id, body.quantity)
        .await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub async fn update_item(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    product_id: web::Path<Uuid>,
    body: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, OrderServiceError> {
    let cart = state
        .services
        .carts
        .update_item(caller.user_id(), product_id.into_inner(), body.quantity)
        .await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub async fn remove_item(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
    product_id: web::Path<Uuid>,
) -> Result<HttpResponse, OrderServiceError> {
    let cart = state
        .services
        .carts
        .remove_item(caller.user_id(), product_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub async fn clear_cart(
    state: web::Data<AppState>,
    caller: AuthenticatedCaller,
) -> Result<HttpResponse, OrderServiceError> {
    let cart = state.services.carts.clear(caller.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}
