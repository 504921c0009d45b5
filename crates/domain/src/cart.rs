//! Cart line items.

use chrono::{DateTime, Utc};
use common::{CartItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::ProductVariant;

/// Errors that can occur while validating a cart line item.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },
}

/// A pending purchase intent for one product by one user.
///
/// At most one line exists per `(user, product)` pair; adding the same
/// product again increments the existing line's quantity. Lines are
/// removed individually or in bulk when an order is created from the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user: UserId,
    pub product: ProductId,

    /// Selected variant, if the product has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<ProductVariant>,

    pub quantity: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new cart line. Fails when the quantity is zero.
    pub fn new(
        user: UserId,
        product: ProductId,
        variant: Option<ProductVariant>,
        quantity: u32,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let now = Utc::now();
        Ok(Self {
            id: CartItemId::new(),
            user,
            product,
            variant,
            quantity,
            created_at: now,
            updated_at: now,
        })
    }
}
