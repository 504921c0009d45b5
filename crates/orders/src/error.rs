//! Workflow error types.

use common::{CartItemId, OrderNumber, UserId};
use domain::{CartError, OrderError};
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur during order and cart workflows.
#[derive(Debug, Error)]
pub enum OrdersError {
    /// A domain validation or transition rule was violated.
    #[error("{0}")]
    Order(#[from] OrderError),

    /// A cart validation rule was violated.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// No order matches the given order number.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderNumber),

    /// No cart line matches the given ID.
    #[error("Cart item not found: {0}")]
    CartItemNotFound(CartItemId),

    /// The requesting user does not own the order.
    #[error("User {user} is not allowed to modify order {order_number}")]
    Forbidden {
        order_number: OrderNumber,
        user: UserId,
    },

    /// Month outside 1..=12.
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, OrdersError>;
