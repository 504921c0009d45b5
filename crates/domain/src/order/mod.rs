//! Order entity and related types.

mod entity;
mod state;
mod totals;
mod value_objects;

pub use entity::Order;
pub use state::{OrderStatus, PaymentMethod, PaymentStatus};
pub use totals::{ClaimedTotals, OrderTotals};
pub use value_objects::{Money, OrderItem, ProductVariant};

use thiserror::Error;

/// Errors that can occur while validating or transitioning an order.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid unit price.
    #[error("Invalid unit price: {price} cents (must be greater than 0)")]
    InvalidPrice { price: i64 },

    /// A monetary adjustment was negative.
    #[error("Invalid {field}: {amount} (must not be negative)")]
    NegativeAmount { field: &'static str, amount: Money },

    /// Discount larger than the item total.
    #[error("Discount {discount} exceeds item total {total}")]
    DiscountExceedsTotal { discount: Money, total: Money },

    /// A client-submitted amount diverged from the server-side
    /// recomputation beyond the rounding tolerance.
    #[error("Submitted {field} {claimed} does not match computed {computed}")]
    TotalsMismatch {
        field: &'static str,
        claimed: Money,
        computed: Money,
    },

    /// Delivery address missing or null.
    #[error("Delivery address is required")]
    MissingAddress,

    /// Unrecognized status value.
    #[error("Invalid status value: {0:?}")]
    InvalidStatus(String),

    /// Status change not permitted from the current state.
    #[error("Cannot transition order from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}
