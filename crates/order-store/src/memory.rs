use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartItemId, OrderNumber, ProductId, UserId};
use domain::{CartItem, Order, OrderStatus, PaymentStatus, ProductVariant};
use tokio::sync::RwLock;

use crate::{
    OrderFilter, OrderQuery, Result, SalesSummary, SortDirection, SortField, StoreError,
    store::{CartStore, OrderStore},
};

/// In-memory order and cart store for testing and single-node use.
///
/// Stores all documents in memory behind an async RwLock and provides
/// the same interface and conditional-update semantics as the
/// PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    orders: Arc<RwLock<Vec<Order>>>,
    cart: Arc<RwLock<Vec<CartItem>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns the total number of cart lines stored.
    pub async fn cart_count(&self) -> usize {
        self.cart.read().await.len()
    }

    /// Clears all orders and cart lines.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
        self.cart.write().await.clear();
    }
}

fn sort_orders(orders: &mut [Order], field: SortField, dir: SortDirection) {
    orders.sort_by(|a, b| {
        let ordering = match field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::NetAmount => a.totals.net_amount.cmp(&b.totals.net_amount),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        };
        match dir {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;

        if orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(
                order.order_number.to_string(),
            ));
        }

        let now = Utc::now();
        order.created_at = now;
        order.updated_at = now;

        orders.push(order.clone());
        Ok(order)
    }

    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .find(|o| &o.order_number == order_number)
            .cloned())
    }

    async fn update_status(
        &self,
        order_number: &OrderNumber,
        expected: Option<&[OrderStatus]>,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;

        // Match-and-set under a single write lock: the identifier and the
        // expected-status condition are checked against the same snapshot
        // the update applies to.
        let Some(order) = orders.iter_mut().find(|o| {
            &o.order_number == order_number
                && expected.is_none_or(|statuses| statuses.contains(&o.status))
        }) else {
            return Ok(None);
        };

        order.status = status;
        if let Some(payment) = payment_status {
            order.payment_status = payment;
        }
        order.updated_at = Utc::now();

        Ok(Some(order.clone()))
    }

    async fn delete_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        let position = orders
            .iter()
            .position(|o| &o.order_number == order_number);
        Ok(position.map(|index| orders.remove(index)))
    }

    async fn find(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .iter()
            .filter(|o| query.filter.matches(o.status, o.user, o.created_at))
            .cloned()
            .collect();

        sort_orders(&mut matching, query.sort_by, query.sort_dir);

        let skip = query.skip.unwrap_or(0);
        let matching: Vec<Order> = matching.into_iter().skip(skip).collect();

        let matching = if let Some(limit) = query.limit {
            matching.into_iter().take(limit).collect()
        } else {
            matching
        };

        Ok(matching)
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| filter.matches(o.status, o.user, o.created_at))
            .count() as u64)
    }

    async fn find_by_user(&self, user: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders.iter().filter(|o| o.user == user).cloned().collect();
        sort_orders(&mut matching, SortField::CreatedAt, SortDirection::Desc);
        Ok(matching)
    }

    async fn monthly_sales(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesSummary> {
        let orders = self.orders.read().await;
        let mut summary = SalesSummary::default();

        for order in orders.iter() {
            if order.status == OrderStatus::Completed
                && order.created_at >= from
                && order.created_at <= to
            {
                summary.total_sales += order.totals.net_amount;
                summary.total_orders += 1;
            }
        }

        Ok(summary)
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn insert_item(&self, mut item: CartItem) -> Result<CartItem> {
        let mut cart = self.cart.write().await;

        if cart
            .iter()
            .any(|line| line.user == item.user && line.product == item.product)
        {
            return Err(StoreError::DuplicateCartLine {
                user: item.user.to_string(),
                product: item.product.to_string(),
            });
        }

        let now = Utc::now();
        item.created_at = now;
        item.updated_at = now;

        cart.push(item.clone());
        Ok(item)
    }

    async fn find_item(&self, id: CartItemId) -> Result<Option<CartItem>> {
        let cart = self.cart.read().await;
        Ok(cart.iter().find(|line| line.id == id).cloned())
    }

    async fn items_for_user(&self, user: UserId) -> Result<Vec<CartItem>> {
        let cart = self.cart.read().await;
        let mut lines: Vec<CartItem> = cart.iter().filter(|l| l.user == user).cloned().collect();
        lines.sort_by_key(|l| l.created_at);
        Ok(lines)
    }

    async fn find_item_by_product(
        &self,
        user: UserId,
        product: &ProductId,
    ) -> Result<Option<CartItem>> {
        let cart = self.cart.read().await;
        Ok(cart
            .iter()
            .find(|line| line.user == user && &line.product == product)
            .cloned())
    }

    async fn update_item(
        &self,
        id: CartItemId,
        quantity: Option<u32>,
        variant: Option<ProductVariant>,
    ) -> Result<Option<CartItem>> {
        let mut cart = self.cart.write().await;

        let Some(line) = cart.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };

        if let Some(quantity) = quantity {
            line.quantity = quantity;
        }
        if let Some(variant) = variant {
            line.variant = Some(variant);
        }
        line.updated_at = Utc::now();

        Ok(Some(line.clone()))
    }

    async fn delete_item(&self, id: CartItemId) -> Result<Option<CartItem>> {
        let mut cart = self.cart.write().await;
        let position = cart.iter().position(|l| l.id == id);
        Ok(position.map(|index| cart.remove(index)))
    }

    async fn clear_user_cart(&self, user: UserId) -> Result<u64> {
        let mut cart = self.cart.write().await;
        let before = cart.len();
        cart.retain(|line| line.user != user);
        Ok((before - cart.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, OrderItem, OrderTotals};
    use serde_json::json;

    fn create_test_order(user: UserId, status: OrderStatus, net_cents: i64) -> Order {
        let items = vec![OrderItem::new(
            "SKU-001",
            "Widget",
            1,
            Money::from_cents(net_cents),
        )];
        let totals = OrderTotals::compute(&items, Money::zero(), Money::zero()).unwrap();
        let mut order = Order::new(user, items, totals, json!({"city": "Springfield"})).unwrap();
        order.status = status;
        order
    }

    fn create_cart_item(user: UserId, product: &str, quantity: u32) -> CartItem {
        CartItem::new(user, ProductId::new(product), None, quantity).unwrap()
    }

    #[tokio::test]
    async fn insert_and_find_order() {
        let store = InMemoryStore::new();
        let order = create_test_order(UserId::new(), OrderStatus::Pending, 1000);
        let number = order.order_number.clone();

        let inserted = store.insert(order).await.unwrap();
        assert_eq!(inserted.order_number, number);

        let found = store.find_by_order_number(&number).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().order_number, number);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_order_number() {
        let store = InMemoryStore::new();
        let order = create_test_order(UserId::new(), OrderStatus::Pending, 1000);

        store.insert(order.clone()).await.unwrap();
        let result = store.insert(order).await;

        assert!(matches!(
            result,
            Err(StoreError::DuplicateOrderNumber(_))
        ));
    }

    #[tokio::test]
    async fn conditional_update_applies_when_status_matches() {
        let store = InMemoryStore::new();
        let order = create_test_order(UserId::new(), OrderStatus::Pending, 1000);
        let number = order.order_number.clone();
        store.insert(order).await.unwrap();

        let updated = store
            .update_status(
                &number,
                Some(&[OrderStatus::Pending, OrderStatus::Processing]),
                OrderStatus::Cancelled,
                Some(PaymentStatus::NotPaid),
            )
            .await
            .unwrap();

        let updated = updated.unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);
        assert_eq!(updated.payment_status, PaymentStatus::NotPaid);
    }

    #[tokio::test]
    async fn conditional_update_misses_on_unexpected_status() {
        let store = InMemoryStore::new();
        let order = create_test_order(UserId::new(), OrderStatus::Delivered, 1000);
        let number = order.order_number.clone();
        store.insert(order).await.unwrap();

        let updated = store
            .update_status(
                &number,
                Some(&[OrderStatus::Pending, OrderStatus::Processing]),
                OrderStatus::Cancelled,
                None,
            )
            .await
            .unwrap();

        assert!(updated.is_none());

        // The order is untouched.
        let found = store.find_by_order_number(&number).await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let store = InMemoryStore::new();
        let order = create_test_order(UserId::new(), OrderStatus::Pending, 1000);
        let number = order.order_number.clone();
        let inserted = store.insert(order).await.unwrap();

        let updated = store
            .update_status(&number, None, OrderStatus::Processing, None)
            .await
            .unwrap()
            .unwrap();

        assert!(updated.updated_at >= inserted.updated_at);
        assert_eq!(updated.created_at, inserted.created_at);
    }

    #[tokio::test]
    async fn delete_returns_deleted_order() {
        let store = InMemoryStore::new();
        let order = create_test_order(UserId::new(), OrderStatus::Pending, 1000);
        let number = order.order_number.clone();
        store.insert(order).await.unwrap();

        let deleted = store.delete_by_order_number(&number).await.unwrap();
        assert!(deleted.is_some());

        let gone = store.find_by_order_number(&number).await.unwrap();
        assert!(gone.is_none());

        let again = store.delete_by_order_number(&number).await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn find_filters_sorts_and_paginates() {
        let store = InMemoryStore::new();
        let user = UserId::new();

        for cents in [100, 200, 300, 400, 500] {
            store
                .insert(create_test_order(user, OrderStatus::Pending, cents))
                .await
                .unwrap();
        }
        store
            .insert(create_test_order(user, OrderStatus::Cancelled, 999))
            .await
            .unwrap();

        let query = OrderQuery::new()
            .status(OrderStatus::Pending)
            .sort_by(SortField::NetAmount)
            .sort_dir(SortDirection::Asc)
            .skip(1)
            .limit(2);

        let orders = store.find(query).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].totals.net_amount.cents(), 200);
        assert_eq!(orders[1].totals.net_amount.cents(), 300);
    }

    #[tokio::test]
    async fn count_honors_filter() {
        let store = InMemoryStore::new();
        let user = UserId::new();

        for _ in 0..3 {
            store
                .insert(create_test_order(user, OrderStatus::Pending, 100))
                .await
                .unwrap();
        }
        store
            .insert(create_test_order(UserId::new(), OrderStatus::Pending, 100))
            .await
            .unwrap();

        let all = store.count(&OrderFilter::new()).await.unwrap();
        assert_eq!(all, 4);

        let filter = OrderFilter {
            user: Some(user),
            ..Default::default()
        };
        assert_eq!(store.count(&filter).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn find_by_user_returns_only_their_orders() {
        let store = InMemoryStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        store
            .insert(create_test_order(alice, OrderStatus::Pending, 100))
            .await
            .unwrap();
        store
            .insert(create_test_order(alice, OrderStatus::Cancelled, 200))
            .await
            .unwrap();
        store
            .insert(create_test_order(bob, OrderStatus::Pending, 300))
            .await
            .unwrap();

        let orders = store.find_by_user(alice).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.user == alice));
    }

    #[tokio::test]
    async fn monthly_sales_counts_only_completed_in_range() {
        let store = InMemoryStore::new();
        let user = UserId::new();

        store
            .insert(create_test_order(user, OrderStatus::Completed, 1000))
            .await
            .unwrap();
        store
            .insert(create_test_order(user, OrderStatus::Completed, 2500))
            .await
            .unwrap();
        store
            .insert(create_test_order(user, OrderStatus::Pending, 9999))
            .await
            .unwrap();

        let now = Utc::now();
        let summary = store
            .monthly_sales(now - chrono::Duration::days(1), now + chrono::Duration::days(1))
            .await
            .unwrap();

        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.total_sales.cents(), 3500);
    }

    #[tokio::test]
    async fn monthly_sales_defaults_to_zero() {
        let store = InMemoryStore::new();
        let now = Utc::now();

        let summary = store
            .monthly_sales(now - chrono::Duration::days(30), now)
            .await
            .unwrap();

        assert_eq!(summary, SalesSummary::default());
    }

    #[tokio::test]
    async fn cart_insert_and_find() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let item = create_cart_item(user, "SKU-001", 2);
        let id = item.id;

        store.insert_item(item).await.unwrap();

        let found = store.find_item(id).await.unwrap();
        assert!(found.is_some());

        let by_product = store
            .find_item_by_product(user, &ProductId::new("SKU-001"))
            .await
            .unwrap();
        assert_eq!(by_product.unwrap().id, id);
    }

    #[tokio::test]
    async fn cart_rejects_duplicate_user_product_line() {
        let store = InMemoryStore::new();
        let user = UserId::new();

        store
            .insert_item(create_cart_item(user, "SKU-001", 1))
            .await
            .unwrap();
        let result = store.insert_item(create_cart_item(user, "SKU-001", 2)).await;

        assert!(matches!(result, Err(StoreError::DuplicateCartLine { .. })));
    }

    #[tokio::test]
    async fn cart_update_quantity() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let item = store
            .insert_item(create_cart_item(user, "SKU-001", 1))
            .await
            .unwrap();

        let updated = store
            .update_item(item.id, Some(5), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.quantity, 5);

        let missing = store
            .update_item(CartItemId::new(), Some(1), None)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn clear_user_cart_removes_only_their_lines() {
        let store = InMemoryStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        store
            .insert_item(create_cart_item(alice, "SKU-001", 1))
            .await
            .unwrap();
        store
            .insert_item(create_cart_item(alice, "SKU-002", 2))
            .await
            .unwrap();
        store
            .insert_item(create_cart_item(bob, "SKU-001", 1))
            .await
            .unwrap();

        let removed = store.clear_user_cart(alice).await.unwrap();
        assert_eq!(removed, 2);

        assert!(store.items_for_user(alice).await.unwrap().is_empty());
        assert_eq!(store.items_for_user(bob).await.unwrap().len(), 1);
    }
}
