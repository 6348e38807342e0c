// ============================================================================
// HTTP API - actix-web transport for the order lifecycle
// ============================================================================
//
// Handlers only translate between HTTP and the services: identity comes from
// the `X-User-Id` / `X-User-Role` headers, bodies are strict JSON, and every
// failure is rendered through `ResponseError for OrderServiceError`.
//
// ============================================================================

mod admin;
mod cart;
mod dto;
mod errors;
mod extractors;
mod health;
mod orders;

use actix_web::web;
use kameo::actor::ActorRef;
use std::sync::Arc;

use crate::actors::{DlqActor, HealthMonitorActor};
use crate::metrics::configure_metrics_route;
use crate::services::{OrderServiceError, OrderServices};

pub use extractors::{AuthenticatedCaller, USER_ID_HEADER, USER_ROLE_HEADER};

/// Shared by every worker of the HTTP server
pub struct AppState {
    pub services: Arc<OrderServices>,
    pub health_monitor: ActorRef<HealthMonitorActor>,
    pub dlq_actor: ActorRef<DlqActor>,
}

/// Mount every route; expects `web::Data<AppState>` and `web::Data<Arc<Metrics>>`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| OrderServiceError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| OrderServiceError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| OrderServiceError::InvalidInput(err.to_string()).into()),
    );

    // Cart
    cfg.service(
        web::resource("/cart")
            .route(web::get().to(cart::get_cart))
            .route(web::delete().to(cart::clear_cart)),
    )
    .service(web::resource("/cart/items").route(web::post().to(cart::add_item)))
    .service(
        web::resource("/cart/items/{product_id}")
            .route(web::put().to(cart::update_item))
            .route(web::delete().to(cart::remove_item)),
    );

    // Orders
    cfg.service(web::resource("/checkout").route(web::post().to(orders::checkout)))
        .service(web::resource("/orders").route(web::get().to(orders::list_orders)))
        .service(web::resource("/orders/{id}").route(web::get().to(orders::get_order)))
        .service(web::resource("/orders/{id}/cancel").route(web::post().to(orders::cancel)))
        .service(
            web::resource("/orders/{id}/payment-proof").route(web::post().to(orders::submit_payment_proof)),
        );

    // Administration
    cfg.service(web::resource("/admin/orders").route(web::get().to(admin::list_all_orders)))
        .service(web::resource("/admin/orders/{id}/status").route(web::put().to(admin::set_status)))
        .service(web::resource("/admin/dead-letters").route(web::get().to(admin::list_dead_letters)));

    // Operational
    cfg.route("/health", web::get().to(health::health));
    configure_metrics_route(cfg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::InMemoryDeadLetterStore;
    use crate::domain::order::OrderStatus;
    use crate::messaging::LogPublisher;
    use crate::services::testing::Harness;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use kameo::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::time::Duration;
    use uuid::Uuid;

    fn state(h: &Harness) -> web::Data<AppState> {
        let health_monitor = HealthMonitorActor::spawn(HealthMonitorActor::new(
            Arc::new(LogPublisher),
            h.metrics.clone(),
            Duration::from_secs(3600),
        ));
        let dlq_actor = DlqActor::spawn(DlqActor::new(
            Arc::new(InMemoryDeadLetterStore::new()),
            h.metrics.clone(),
        ));

        web::Data::new(AppState {
            services: h.services.clone(),
            health_monitor,
            dlq_actor,
        })
    }

    macro_rules! init_app {
        ($h:expr) => {
            test::init_service(
                App::new()
                    .app_data(state(&$h))
                    .app_data(web::Data::new($h.metrics.clone()))
                    .configure(configure),
            )
            .await
        };
    }

    fn as_user(req: test::TestRequest, user_id: Uuid, role: &str) -> test::TestRequest {
        req.insert_header((USER_ID_HEADER, user_id.to_string()))
            .insert_header((USER_ROLE_HEADER, role.to_string()))
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    fn checkout_body(payment_method: &str) -> Value {
        json!({
            "delivery": {"name": "Ada Lovelace", "phone": "+44 20 7946 0958", "address": "12 St James's Square"},
            "payment_method": payment_method,
        })
    }

    #[actix_web::test]
    async fn test_cart_to_order_over_http() {
        let h = Harness::new();
        let product = h.add_product("Desk Lamp", dec!(100), 5);
        let customer = Uuid::new_v4();
        let app = init_app!(h);

        let req = as_user(test::TestRequest::post().uri("/cart/items"), customer, "customer")
            .set_json(json!({"product_id": product, "quantity": 2}))
            .to_request();
        let cart: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(decimal(&cart["subtotal"]), dec!(200));

        let req = as_user(test::TestRequest::post().uri("/checkout"), customer, "customer")
            .set_json(checkout_body("cash_on_delivery"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let order: Value = test::read_body_json(resp).await;
        assert_eq!(order["status"], "processing");
        assert_eq!(decimal(&order["total"]), dec!(250));
        assert_eq!(h.stock(product).await, 3);

        let req = as_user(test::TestRequest::get().uri("/orders"), customer, "customer").to_request();
        let orders: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(orders.len(), 1);

        let req = as_user(test::TestRequest::get().uri("/cart"), customer, "customer").to_request();
        let cart: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_missing_identity_is_invalid_input() {
        let h = Harness::new();
        let app = init_app!(h);

        let req = test::TestRequest::get().uri("/cart").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_input");
    }

    #[actix_web::test]
    async fn test_malformed_requests_are_invalid_input() {
        let h = Harness::new();
        let product = h.add_product("Desk Lamp", dec!(100), 5);
        let customer = Uuid::new_v4();
        let app = init_app!(h);

        let req = as_user(test::TestRequest::post().uri("/cart/items"), customer, "customer")
            .set_json(json!({"product_id": product, "quantity": 1, "gift_wrap": true}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = as_user(test::TestRequest::get().uri("/orders/not-a-uuid"), customer, "customer").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_input");
    }

    #[actix_web::test]
    async fn test_checkout_rejections_map_to_status_codes() {
        let h = Harness::new();
        let product = h.add_product("Desk Lamp", dec!(100), 1);
        let customer = Uuid::new_v4();
        let app = init_app!(h);

        let req = as_user(test::TestRequest::post().uri("/checkout"), customer, "customer")
            .set_json(checkout_body("cash_on_delivery"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "empty_cart");

        h.services.carts.add_item(customer, product, 2).await.unwrap();
        let req = as_user(test::TestRequest::post().uri("/checkout"), customer, "customer")
            .set_json(checkout_body("cash_on_delivery"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "insufficient_stock");
        assert_eq!(body["product_id"], product.to_string());
    }

    #[actix_web::test]
    async fn test_cancel_with_and_without_body() {
        let h = Harness::new();
        let product = h.add_product("Desk Lamp", dec!(100), 5);
        let owner = Uuid::new_v4();
        let first = h.place_order(owner, product, 1, crate::domain::order::PaymentMethod::CashOnDelivery).await;
        let second = h.place_order(owner, product, 1, crate::domain::order::PaymentMethod::CashOnDelivery).await;
        let app = init_app!(h);

        let req = as_user(
            test::TestRequest::post().uri(&format!("/orders/{}/cancel", first.id)),
            Uuid::new_v4(),
            "customer",
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = as_user(
            test::TestRequest::post().uri(&format!("/orders/{}/cancel", first.id)),
            owner,
            "customer",
        )
        .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order["status"], "cancelled");

        let req = as_user(
            test::TestRequest::post().uri(&format!("/orders/{}/cancel", second.id)),
            owner,
            "customer",
        )
        .set_json(json!({"reason": "ordered twice"}))
        .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order["cancellation_reason"], "ordered twice");
        assert_eq!(h.stock(product).await, 5);
    }

    #[actix_web::test]
    async fn test_payment_proof_flow() {
        let h = Harness::new();
        let product = h.add_product("Desk Lamp", dec!(100), 5);
        let owner = Uuid::new_v4();
        let order = h
            .place_order(owner, product, 1, crate::domain::order::PaymentMethod::PrepaidManualVerification)
            .await;
        let app = init_app!(h);
        let uri = format!("/orders/{}/payment-proof", order.id);

        let req = as_user(test::TestRequest::post().uri(&uri), owner, "customer")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "missing_proof");

        let req = as_user(test::TestRequest::post().uri(&uri), owner, "customer")
            .set_json(json!({"artifact_ref": "uploads/receipt-1.jpg", "external_transaction_ref": "TX-991"}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], "processing");

        let req = as_user(test::TestRequest::post().uri(&uri), owner, "customer")
            .set_json(json!({"artifact_ref": "uploads/receipt-2.jpg"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "not_awaiting_payment");
    }

    #[actix_web::test]
    async fn test_admin_routes() {
        let h = Harness::new();
        let product = h.add_product("Desk Lamp", dec!(100), 5);
        let owner = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let order = h.place_order(owner, product, 1, crate::domain::order::PaymentMethod::CashOnDelivery).await;
        let app = init_app!(h);
        let status_uri = format!("/admin/orders/{}/status", order.id);

        let req = as_user(test::TestRequest::get().uri("/admin/orders"), owner, "customer").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = as_user(test::TestRequest::put().uri(&status_uri), admin, "administrator")
            .set_json(json!({"status": "shipped"}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], OrderStatus::Shipped.as_str());

        let req = as_user(test::TestRequest::put().uri(&status_uri), admin, "administrator")
            .set_json(json!({"status": "processing"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "illegal_status_transition");

        let req = as_user(test::TestRequest::put().uri(&status_uri), admin, "administrator")
            .set_json(json!({"status": "lost"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = as_user(test::TestRequest::get().uri("/admin/orders?status=shipped"), admin, "administrator")
            .to_request();
        let shipped: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(shipped.len(), 1);

        let req = as_user(test::TestRequest::get().uri("/admin/orders?status=delivered"), admin, "administrator")
            .to_request();
        let delivered: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(delivered.is_empty());

        let req = as_user(test::TestRequest::get().uri("/admin/dead-letters"), admin, "administrator").to_request();
        let letters: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(letters.is_empty());
    }

    #[actix_web::test]
    async fn test_operational_endpoints() {
        let h = Harness::new();
        let app = init_app!(h);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
