use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartError, CartStore};
use crate::domain::catalog::ProductCatalog;
use super::errors::OrderServiceError;

/// Cart line joined with current catalog data
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: Uuid,
    pub quantity: u32,
    /// `None` once the product has left the catalog
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub line_total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub owner_id: Uuid,
    pub items: Vec<CartItemView>,
    /// Sum over items that still have a price
    pub subtotal: Decimal,
}

pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { carts, catalog }
    }

    pub async fn get_cart(&self, owner_id: Uuid) -> Result<CartView, OrderServiceError> {
        let cart = self.carts.get(owner_id).await?;
        self.view(cart).await
    }

    pub async fn add_item(&self, owner_id: Uuid, product_id: Uuid, quantity: u32) -> Result<CartView, OrderServiceError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity.into());
        }
        if self.catalog.get_product(product_id).await?.is_none() {
            return Err(CartError::UnknownProduct(product_id).into());
        }

        let cart = self.carts.add_item(owner_id, product_id, quantity).await?;
        tracing::debug!(owner_id = %owner_id, product_id = %product_id, quantity = quantity, "Added to cart");

        self.view(cart).await
    }

    pub async fn update_item(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<CartView, OrderServiceError> {
        let cart = self.carts.update_quantity(owner_id, product_id, quantity).await?;
        tracing::debug!(owner_id = %owner_id, product_id = %product_id, quantity = quantity, "Cart quantity updated");

        self.view(cart).await
    }

    pub async fn remove_item(&self, owner_id: Uuid, product_id: Uuid) -> Result<CartView, OrderServiceError> {
        let cart = self.carts.remove_item(owner_id, product_id).await?;
        self.view(cart).await
    }

    pub async fn clear(&self, owner_id: Uuid) -> Result<CartView, OrderServiceError> {
        let cart = self.carts.clear(owner_id).await?;
        tracing::debug!(owner_id = %owner_id, "Cart cleared");

        self.view(cart).await
    }

    async fn view(&self, cart: Cart) -> Result<CartView, OrderServiceError> {
        let mut items = Vec::with_capacity(cart.lines.len());
        let mut subtotal = Decimal::ZERO;

        for line in cart.lines {
            let product = self.catalog.get_product(line.product_id).await?;
            let line_total = product
                .as_ref()
                .map(|p| p.unit_price * Decimal::from(line.quantity));
            subtotal += line_total.unwrap_or(Decimal::ZERO);

            items.push(CartItemView {
                product_id: line.product_id,
                quantity: line.quantity,
                name: product.as_ref().map(|p| p.name.clone()),
                unit_price: product.map(|p| p.unit_price),
                line_total,
            });
        }

        Ok(CartView {
            owner_id: cart.owner_id,
            items,
            subtotal,
        })
    }
}
