//! Order lifecycle workflows.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use common::{OrderNumber, UserId};
use domain::{
    ClaimedTotals, Money, Order, OrderError, OrderItem, OrderStatus, OrderTotals, PaymentStatus,
};
use order_store::{CartStore, OrderFilter, OrderQuery, OrderStore, SortDirection, SortField};

use crate::error::{OrdersError, Result};

/// Statuses a customer may still cancel from.
const CANCELLABLE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Processing];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Input for the order creation workflow.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The purchasing user.
    pub user: UserId,

    /// Line items taken from the client's cart view.
    pub items: Vec<OrderItem>,

    /// Client-submitted amounts, verified against the server-side
    /// recomputation before the order is accepted.
    pub claimed: ClaimedTotals,

    /// Delivery address snapshot.
    pub selected_address: serde_json::Value,
}

/// How an administrative status update treats the transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Only forward-legal transitions are applied (the default).
    #[default]
    Enforced,

    /// Any recognized status may be set regardless of the current one.
    /// Reserved for operators fixing up mis-entered states; unknown
    /// statuses and missing orders are still rejected.
    Override,
}

/// Listing parameters for the administrative order view.
#[derive(Debug, Clone)]
pub struct OrderListRequest {
    pub status: Option<OrderStatus>,
    pub user: Option<UserId>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,

    /// 1-based page number.
    pub page: u32,

    /// Page size.
    pub limit: u32,
}

impl Default for OrderListRequest {
    fn default() -> Self {
        Self {
            status: None,
            user: None,
            created_from: None,
            created_to: None,
            sort_by: SortField::default(),
            sort_dir: SortDirection::default(),
            page: 1,
            limit: 10,
        }
    }
}

/// One page of orders plus pagination metadata.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_orders: u64,
}

/// Aggregated sales for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySales {
    /// English month name, e.g. `"August"`.
    pub month: &'static str,
    pub total_sales: Money,
    pub total_orders: u64,
}

/// Service coordinating the order lifecycle over the order and cart
/// stores.
///
/// Creation persists the order first and clears the cart afterwards as a
/// separate best-effort step; status changes go through the store's
/// conditional match-and-set so concurrent requests cannot lose updates.
pub struct OrderService<S> {
    store: S,
}

impl<S: OrderStore + CartStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a pending cash-on-delivery order from a cart-derived
    /// request and clears the user's cart.
    ///
    /// Totals are recomputed from the items; client-submitted amounts
    /// that diverge beyond the rounding tolerance are rejected. The
    /// order is durably inserted before the cart is touched, and a
    /// failure to clear the cart is logged and swallowed: the stale
    /// lines are recoverable, the committed order is not rolled back.
    #[tracing::instrument(skip(self, new_order), fields(user = %new_order.user))]
    pub async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let totals = OrderTotals::from_claimed(&new_order.items, &new_order.claimed)?;
        let order = Order::new(
            new_order.user,
            new_order.items,
            totals,
            new_order.selected_address,
        )?;

        let order = OrderStore::insert(&self.store, order).await?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_number = %order.order_number, "order created");

        match self.store.clear_user_cart(order.user).await {
            Ok(removed) => {
                metrics::counter!("carts_cleared_total").increment(1);
                tracing::debug!(removed, user = %order.user, "cart cleared after order");
            }
            Err(error) => {
                // The order is already committed; stale cart lines are a
                // recoverable inconsistency, not a failed request.
                tracing::warn!(
                    order_number = %order.order_number,
                    user = %order.user,
                    %error,
                    "failed to clear cart after order creation"
                );
            }
        }

        Ok(order)
    }

    /// Cancels an order on behalf of its owner.
    ///
    /// Only the owning user may cancel, and only while the order is
    /// still `pending` or `processing`. Retrying after a successful
    /// cancellation reports `InvalidTransition` (the order is already
    /// `cancelled`); callers may treat that as the desired end state.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_number: &OrderNumber, user: UserId) -> Result<Order> {
        let order = self
            .store
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| OrdersError::OrderNotFound(order_number.clone()))?;

        if !order.is_owned_by(user) {
            return Err(OrdersError::Forbidden {
                order_number: order_number.clone(),
                user,
            });
        }
        if !order.status.is_cancellable() {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            }
            .into());
        }

        let payment = PaymentStatus::implied_by(OrderStatus::Cancelled, order.payment_status);
        let updated = self
            .store
            .update_status(
                order_number,
                Some(&CANCELLABLE),
                OrderStatus::Cancelled,
                payment,
            )
            .await?;

        match updated {
            Some(order) => {
                metrics::counter!("orders_cancelled_total").increment(1);
                tracing::info!(order_number = %order.order_number, "order cancelled");
                Ok(order)
            }
            // Lost a race: someone moved the order out of the cancellable
            // set between the read and the conditional write.
            None => Err(self.transition_conflict(order_number, OrderStatus::Cancelled).await?),
        }
    }

    /// Applies an administrative status update.
    ///
    /// Under `TransitionPolicy::Enforced` the transition must be
    /// forward-legal from the order's current status, and the write is
    /// conditional on that observed status so racing updates cannot be
    /// lost. `TransitionPolicy::Override` bypasses the graph for
    /// operators but still requires an existing order.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_number: &OrderNumber,
        status: OrderStatus,
        policy: TransitionPolicy,
    ) -> Result<Order> {
        let order = self
            .store
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| OrdersError::OrderNotFound(order_number.clone()))?;

        let observed = [order.status];
        let expected: Option<&[OrderStatus]> = match policy {
            TransitionPolicy::Enforced => {
                if !order.status.can_transition_to(status) {
                    return Err(OrderError::InvalidTransition {
                        from: order.status,
                        to: status,
                    }
                    .into());
                }
                Some(&observed)
            }
            TransitionPolicy::Override => None,
        };

        let payment = PaymentStatus::implied_by(status, order.payment_status);
        let updated = self
            .store
            .update_status(order_number, expected, status, payment)
            .await?;

        match updated {
            Some(order) => {
                metrics::counter!("order_status_updates_total").increment(1);
                tracing::info!(
                    order_number = %order.order_number,
                    status = %order.status,
                    "order status updated"
                );
                Ok(order)
            }
            None => Err(self.transition_conflict(order_number, status).await?),
        }
    }

    /// Deletes an order outright (administrative).
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_number: &OrderNumber) -> Result<Order> {
        self.store
            .delete_by_order_number(order_number)
            .await?
            .ok_or_else(|| OrdersError::OrderNotFound(order_number.clone()))
    }

    /// Retrieves an order by its order number.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_number: &OrderNumber) -> Result<Order> {
        self.store
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| OrdersError::OrderNotFound(order_number.clone()))
    }

    /// Lists orders for the administrative view, with pagination
    /// metadata.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, request: OrderListRequest) -> Result<OrderPage> {
        let page = request.page.max(1);
        let limit = request.limit.max(1);

        let filter = OrderFilter {
            status: request.status,
            user: request.user,
            created_from: request.created_from,
            created_to: request.created_to,
        };
        let query = OrderQuery {
            filter: filter.clone(),
            sort_by: request.sort_by,
            sort_dir: request.sort_dir,
            skip: Some(((page - 1) * limit) as usize),
            limit: Some(limit as usize),
        };

        let orders = self.store.find(query).await?;
        let total_orders = self.store.count(&filter).await?;
        let total_pages = total_orders.div_ceil(limit as u64) as u32;

        Ok(OrderPage {
            orders,
            current_page: page,
            total_pages,
            total_orders,
        })
    }

    /// Lists every order owned by a user, newest first, regardless of
    /// status.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_by_user(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.store.find_by_user(user).await?)
    }

    /// Aggregates completed-order sales for one calendar month (UTC).
    ///
    /// A month with no completed orders yields a zero-valued summary.
    #[tracing::instrument(skip(self))]
    pub async fn monthly_sales(&self, year: i32, month: u32) -> Result<MonthlySales> {
        let (from, to) = month_range(year, month)?;
        let summary = self.store.monthly_sales(from, to).await?;

        Ok(MonthlySales {
            month: MONTH_NAMES[(month - 1) as usize],
            total_sales: summary.total_sales,
            total_orders: summary.total_orders,
        })
    }

    /// Builds the error for a conditional update that matched nothing:
    /// the order either moved to a conflicting status or disappeared.
    async fn transition_conflict(
        &self,
        order_number: &OrderNumber,
        to: OrderStatus,
    ) -> Result<OrdersError> {
        Ok(match self.store.find_by_order_number(order_number).await? {
            Some(current) => OrderError::InvalidTransition {
                from: current.status,
                to,
            }
            .into(),
            None => OrdersError::OrderNotFound(order_number.clone()),
        })
    }
}

/// UTC range covering one calendar month, from the first instant of its
/// first day to the last second of its last day.
fn month_range(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or(OrdersError::InvalidMonth(month))?;
    let next_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(OrdersError::InvalidMonth(month))?;

    let from = start.and_time(NaiveTime::MIN).and_utc();
    let to = next_start.and_time(NaiveTime::MIN).and_utc() - Duration::seconds(1);
    Ok((from, to))
}
