use rust_decimal::Decimal;

/// Computes the shipping charge for an order subtotal
pub trait ShippingPolicy: Send + Sync {
    fn shipping_charge(&self, subtotal: Decimal) -> Decimal;
}

/// One flat fee per order, waived at or above an optional threshold
#[derive(Debug, Clone)]
pub struct FlatRateShipping {
    flat_rate: Decimal,
    free_shipping_threshold: Option<Decimal>,
}

impl FlatRateShipping {
    pub fn new(flat_rate: Decimal, free_shipping_threshold: Option<Decimal>) -> Self {
        Self {
            flat_rate: flat_rate.max(Decimal::ZERO),
            free_shipping_threshold,
        }
    }
}

impl ShippingPolicy for FlatRateShipping {
    fn shipping_charge(&self, subtotal: Decimal) -> Decimal {
        match self.free_shipping_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => self.flat_rate,
        }
    }
}
