//! Order lifecycle workflows for the order service.
//!
//! Coordinates the multi-step flows the HTTP layer exposes:
//! - order creation (validate, recompute totals, persist, clear cart)
//! - customer cancellation with ownership and cancellable-state rules
//! - administrative status updates through the transition graph
//! - paginated listings and monthly sales aggregation
//! - cart add/increment, update, remove, and clear

pub mod cart_service;
pub mod error;
pub mod order_service;

pub use cart_service::CartService;
pub use error::{OrdersError, Result};
pub use order_service::{
    MonthlySales, NewOrder, OrderListRequest, OrderPage, OrderService, TransitionPolicy,
};
