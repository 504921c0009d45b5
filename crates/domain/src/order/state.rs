//! Order lifecycle enums and the status transition graph.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its lifecycle.
///
/// Forward transitions:
/// ```text
/// Pending ──┬──► Processing ──┬──► Placed ──┬──► Shipping ──► Shipped ──► Delivered ──► Completed
///           │                 │             │
///           ├──► Placed       ├──► Shipping └──► Shipped
///           │                 └──► Shipped
///           └──► Cancelled (also from Processing)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order has been created and awaits handling.
    #[default]
    Pending,

    /// Order is being prepared.
    Processing,

    /// Order has been confirmed and handed to fulfilment.
    Placed,

    /// Order is on its way to the customer.
    Shipping,

    /// Order has left the warehouse.
    Shipped,

    /// Order has reached the customer.
    Delivered,

    /// Order is finished (terminal state).
    Completed,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// All recognized status values.
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Placed,
        OrderStatus::Shipping,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Returns the forward-legal successor statuses of this status.
    pub fn successors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[
                OrderStatus::Processing,
                OrderStatus::Placed,
                OrderStatus::Cancelled,
            ],
            OrderStatus::Processing => &[
                OrderStatus::Placed,
                OrderStatus::Shipping,
                OrderStatus::Shipped,
                OrderStatus::Cancelled,
            ],
            OrderStatus::Placed => &[OrderStatus::Shipping, OrderStatus::Shipped],
            OrderStatus::Shipping => &[OrderStatus::Shipped],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    /// Returns true if the transition to `next` is forward-legal.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Returns true if a customer may still cancel in this status.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the status name as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Placed => "placed",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

/// How an order is paid for. A single method is supported today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Payment is collected in cash when the order is handed over.
    #[default]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Returns the payment method as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement state of an order's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment has not been collected yet.
    #[default]
    Pending,

    /// Payment was collected.
    Paid,

    /// Payment will not be collected (order cancelled before handover).
    NotPaid,
}

impl PaymentStatus {
    /// Returns the payment status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::NotPaid => "not_paid",
        }
    }

    /// Payment status implied by an order status change, if any.
    ///
    /// Cash-on-delivery settles at handover: reaching `Delivered` marks the
    /// payment `Paid`; cancelling an order whose payment is still `Pending`
    /// marks it `NotPaid`. Every other transition leaves payment untouched.
    pub fn implied_by(status: OrderStatus, current: PaymentStatus) -> Option<PaymentStatus> {
        match status {
            OrderStatus::Delivered => Some(PaymentStatus::Paid),
            OrderStatus::Cancelled if current == PaymentStatus::Pending => {
                Some(PaymentStatus::NotPaid)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
