use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::services::OrderServiceError;

// ============================================================================
// HTTP mapping for service errors
// ============================================================================

impl ResponseError for OrderServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderServiceError::EmptyCart
            | OrderServiceError::MissingProof
            | OrderServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            OrderServiceError::NotAuthorized => StatusCode::FORBIDDEN,
            OrderServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderServiceError::InsufficientStock { .. }
            | OrderServiceError::IllegalStatusTransition { .. }
            | OrderServiceError::NotAwaitingPayment(_) => StatusCode::CONFLICT,
            OrderServiceError::OrderPersistenceFailed(_) | OrderServiceError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            OrderServiceError::Storage(e) => {
                tracing::error!(error = %e, "Request failed on storage");
                "Storage is unavailable".to_string()
            }
            OrderServiceError::OrderPersistenceFailed(_) => {
                tracing::error!(error = %self, "Request failed on order persistence");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let mut body = json!({
            "error": self.kind(),
            "message": message,
        });

        match self {
            OrderServiceError::InsufficientStock { product_id } => {
                body["product_id"] = json!(product_id);
            }
            OrderServiceError::IllegalStatusTransition { from, to } => {
                body["from"] = json!(from);
                body["to"] = json!(to);
            }
            OrderServiceError::NotAwaitingPayment(status) => {
                body["status"] = json!(status);
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use actix_web::body::to_bytes;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(OrderServiceError::EmptyCart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(OrderServiceError::NotAuthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(OrderServiceError::order_not_found(Uuid::new_v4()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            OrderServiceError::NotAwaitingPayment(OrderStatus::Processing).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            OrderServiceError::Storage(anyhow::anyhow!("connection reset")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_body_names_kind_and_product() {
        let product_id = Uuid::new_v4();
        let response = OrderServiceError::InsufficientStock { product_id }.error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "insufficient_stock");
        assert_eq!(body["product_id"], product_id.to_string());
    }

    #[actix_web::test]
    async fn test_storage_details_stay_in_the_log() {
        let response = OrderServiceError::Storage(anyhow::anyhow!("node 10.0.0.3 timed out")).error_response();

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "storage");
        assert!(!body["message"].as_str().unwrap().contains("10.0.0.3"));
    }
}
