//! The order entity.

use chrono::{DateTime, Utc};
use common::{OrderNumber, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderItem, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus};

/// A persisted record of a purchase.
///
/// The `items` and `selected_address` fields are snapshots taken at
/// creation; they never reference live cart or catalog state. Timestamps
/// are owned by the persistence layer: `Order::new` stamps provisional
/// values and the store overwrites them on insert and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique human-readable identifier, generated at creation.
    pub order_number: OrderNumber,

    /// The purchasing user.
    pub user: UserId,

    /// Line items, snapshotted at creation.
    pub items: Vec<OrderItem>,

    /// Monetary amounts, recomputed server-side at creation.
    #[serde(flatten)]
    pub totals: OrderTotals,

    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,

    /// Opaque snapshot of the delivery address at order time.
    pub selected_address: serde_json::Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending cash-on-delivery order with a freshly
    /// generated order number.
    pub fn new(
        user: UserId,
        items: Vec<OrderItem>,
        totals: OrderTotals,
        selected_address: serde_json::Value,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if selected_address.is_null() {
            return Err(OrderError::MissingAddress);
        }

        let now = Utc::now();
        Ok(Self {
            order_number: OrderNumber::generate(),
            user,
            items,
            totals,
            payment_method: PaymentMethod::CashOnDelivery,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            selected_address,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if `user` owns this order.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user == user
    }

    /// Number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
