use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartItemId, OrderNumber, ProductId, UserId};
use domain::{CartItem, Order, OrderStatus, PaymentStatus, ProductVariant};

use crate::{OrderFilter, OrderQuery, Result, SalesSummary};

/// Persistence contract for orders.
///
/// All implementations must be thread-safe (Send + Sync). Timestamps are
/// owned by the store: `insert` assigns `created_at`/`updated_at` and
/// every mutation refreshes `updated_at`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    ///
    /// Fails with `DuplicateOrderNumber` if an order with the same
    /// order number already exists.
    async fn insert(&self, order: Order) -> Result<Order>;

    /// Retrieves an order by its order number.
    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>>;

    /// Conditionally updates an order's status in a single atomic
    /// match-and-set.
    ///
    /// The update applies only when the order exists and, if `expected`
    /// is given, its current status is one of the expected values; it
    /// returns the updated document, or `None` when nothing matched.
    /// Concurrent writers therefore cannot lose updates: the loser of a
    /// race observes `None` instead of silently overwriting.
    async fn update_status(
        &self,
        order_number: &OrderNumber,
        expected: Option<&[OrderStatus]>,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Option<Order>>;

    /// Deletes an order, returning the deleted document if it existed.
    async fn delete_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>>;

    /// Retrieves orders matching a query (filter, sort, skip/limit).
    async fn find(&self, query: OrderQuery) -> Result<Vec<Order>>;

    /// Counts orders matching a filter.
    async fn count(&self, filter: &OrderFilter) -> Result<u64>;

    /// Retrieves all orders owned by a user, newest first.
    async fn find_by_user(&self, user: UserId) -> Result<Vec<Order>>;

    /// Aggregates net amount and count over completed orders created
    /// within `[from, to]`.
    ///
    /// Returns a zero-valued summary when no orders match; an empty
    /// period is not an error.
    async fn monthly_sales(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesSummary>;
}

/// Persistence contract for cart line items.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Persists a new cart line.
    ///
    /// Fails with `DuplicateCartLine` if the user already has a line for
    /// the same product; callers increment via `update_item` instead.
    async fn insert_item(&self, item: CartItem) -> Result<CartItem>;

    /// Retrieves a cart line by ID.
    async fn find_item(&self, id: CartItemId) -> Result<Option<CartItem>>;

    /// Retrieves all cart lines for a user, oldest first.
    async fn items_for_user(&self, user: UserId) -> Result<Vec<CartItem>>;

    /// Retrieves the user's cart line for a product, if any.
    async fn find_item_by_product(
        &self,
        user: UserId,
        product: &ProductId,
    ) -> Result<Option<CartItem>>;

    /// Updates a cart line's quantity and/or variant, returning the
    /// updated line or `None` when it does not exist.
    async fn update_item(
        &self,
        id: CartItemId,
        quantity: Option<u32>,
        variant: Option<ProductVariant>,
    ) -> Result<Option<CartItem>>;

    /// Deletes a cart line, returning it if it existed.
    async fn delete_item(&self, id: CartItemId) -> Result<Option<CartItem>>;

    /// Deletes every cart line belonging to a user, returning the number
    /// of lines removed.
    async fn clear_user_cart(&self, user: UserId) -> Result<u64>;
}
