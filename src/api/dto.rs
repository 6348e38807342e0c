use serde::Deserialize;
use uuid::Uuid;

use crate::domain::order::{DeliveryDetails, OrderStatus, PaymentMethod};
use crate::services::OrderServiceError;

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryRequest {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl From<DeliveryRequest> for DeliveryDetails {
    fn from(req: DeliveryRequest) -> Self {
        DeliveryDetails {
            name: req.name,
            phone: req.phone,
            address: req.address,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutRequest {
    pub delivery: DeliveryRequest,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

impl CancelRequest {
    /// The body is optional; an empty one means no reason
    pub fn from_body(body: &[u8]) -> Result<Self, OrderServiceError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| OrderServiceError::InvalidInput(e.to_string()))
    }
}

/// A missing artifact is reported as `missing_proof`, not as a parse error
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentProofRequest {
    #[serde(default)]
    pub artifact_ref: Option<String>,
    #[serde(default)]
    pub external_transaction_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusFilter {
    pub status: Option<String>,
}

pub fn parse_status(raw: &str) -> Result<OrderStatus, OrderServiceError> {
    raw.parse::<OrderStatus>()
        .map_err(|e| OrderServiceError::InvalidInput(e.to_string()))
}
