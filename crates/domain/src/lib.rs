//! Domain layer for the order service.
//!
//! This crate provides the core domain types:
//! - Order entity with its status state machine
//! - Monetary calculator (`OrderTotals`) with client-total verification
//! - Cart line items consumed at order creation
//!
//! The domain is storage-agnostic; persistence lives behind the
//! repository traits in the `order-store` crate.

pub mod cart;
pub mod order;

pub use cart::{CartError, CartItem};
pub use order::{
    ClaimedTotals, Money, Order, OrderError, OrderItem, OrderStatus, OrderTotals, PaymentMethod,
    PaymentStatus, ProductVariant,
};
