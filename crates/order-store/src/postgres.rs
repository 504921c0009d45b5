use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartItemId, OrderNumber, ProductId, UserId};
use domain::{
    CartItem, Money, Order, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus, ProductVariant,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderFilter, OrderQuery, Result, SalesSummary, StoreError,
    store::{CartStore, OrderStore},
};

const ORDER_COLUMNS: &str = "order_number, user_id, items, total_amount_cents, \
     discount_amount_cents, gross_amount_cents, shipping_amount_cents, net_amount_cents, \
     payment_method, payment_status, status, selected_address, created_at, updated_at";

const CART_COLUMNS: &str = "id, user_id, product_id, variant, quantity, created_at, updated_at";

/// PostgreSQL-backed order and cart store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        tracing::info!("running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items = serde_json::from_value(items_json)?;

        let payment_method: PaymentMethod = decode_enum(row.try_get("payment_method")?)?;
        let payment_status: PaymentStatus = decode_enum(row.try_get("payment_status")?)?;
        let status: OrderStatus = decode_enum(row.try_get("status")?)?;

        Ok(Order {
            order_number: OrderNumber::new(row.try_get::<String, _>("order_number")?),
            user: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            totals: OrderTotals {
                total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
                discount_amount: Money::from_cents(row.try_get("discount_amount_cents")?),
                gross_amount: Money::from_cents(row.try_get("gross_amount_cents")?),
                shipping_amount: Money::from_cents(row.try_get("shipping_amount_cents")?),
                net_amount: Money::from_cents(row.try_get("net_amount_cents")?),
            },
            payment_method,
            payment_status,
            status,
            selected_address: row.try_get("selected_address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItem> {
        let variant_json: Option<serde_json::Value> = row.try_get("variant")?;
        let variant = variant_json.map(serde_json::from_value).transpose()?;

        Ok(CartItem {
            id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            product: ProductId::new(row.try_get::<String, _>("product_id")?),
            variant,
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Decodes a lowercase wire string into a serde enum.
fn decode_enum<T: serde::de::DeserializeOwned>(s: String) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(s))?)
}

/// Encodes a serde enum into its lowercase wire string.
fn encode_enum<T: serde::Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(StoreError::Serialization(serde::de::Error::custom(
            format!("expected string-encoded enum, got {other}"),
        ))),
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        let items = serde_json::to_value(&order.items)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (order_number, user_id, items, total_amount_cents,
                discount_amount_cents, gross_amount_cents, shipping_amount_cents,
                net_amount_cents, payment_method, payment_status, status, selected_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.order_number.as_str())
        .bind(order.user.as_uuid())
        .bind(&items)
        .bind(order.totals.total_amount.cents())
        .bind(order.totals.discount_amount.cents())
        .bind(order.totals.gross_amount.cents())
        .bind(order.totals.shipping_amount.cents())
        .bind(order.totals.net_amount.cents())
        .bind(encode_enum(&order.payment_method)?)
        .bind(encode_enum(&order.payment_status)?)
        .bind(encode_enum(&order.status)?)
        .bind(&order.selected_address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::DuplicateOrderNumber(order.order_number.to_string());
            }
            StoreError::Database(e)
        })?;

        Self::row_to_order(row)
    }

    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn update_status(
        &self,
        order_number: &OrderNumber,
        expected: Option<&[OrderStatus]>,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Option<Order>> {
        let expected: Option<Vec<String>> = expected
            .map(|statuses| {
                statuses
                    .iter()
                    .map(encode_enum)
                    .collect::<Result<Vec<String>>>()
            })
            .transpose()?;
        let payment_status = payment_status.as_ref().map(encode_enum).transpose()?;

        // One conditional statement: match by identifier plus the optional
        // expected-status set, and write the new values in the same round
        // trip, so racing writers cannot interleave a read-modify-write.
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET status = $2,
                payment_status = COALESCE($3, payment_status),
                updated_at = now()
            WHERE order_number = $1
              AND ($4::text[] IS NULL OR status = ANY($4))
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_number.as_str())
        .bind(encode_enum(&status)?)
        .bind(payment_status)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn delete_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "DELETE FROM orders WHERE order_number = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn find(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.filter.user.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if query.filter.created_from.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if query.filter.created_to.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }

        sql.push_str(&format!(
            " ORDER BY {} {}",
            query.sort_by.column(),
            query.sort_dir.keyword()
        ));

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.skip.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(status) = query.filter.status {
            sqlx_query = sqlx_query.bind(encode_enum(&status)?);
        }
        if let Some(user) = query.filter.user {
            sqlx_query = sqlx_query.bind(user.as_uuid());
        }
        if let Some(from) = query.filter.created_from {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = query.filter.created_to {
            sqlx_query = sqlx_query.bind(to);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(skip) = query.skip {
            sqlx_query = sqlx_query.bind(skip as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM orders WHERE 1=1");
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if filter.user.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if filter.created_from.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if filter.created_to.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }

        let mut sqlx_query = sqlx::query_scalar::<_, i64>(&sql);

        if let Some(status) = filter.status {
            sqlx_query = sqlx_query.bind(encode_enum(&status)?);
        }
        if let Some(user) = filter.user {
            sqlx_query = sqlx_query.bind(user.as_uuid());
        }
        if let Some(from) = filter.created_from {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = filter.created_to {
            sqlx_query = sqlx_query.bind(to);
        }

        let count = sqlx_query.fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn find_by_user(&self, user: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn monthly_sales(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesSummary> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(net_amount_cents), 0)::BIGINT AS total_sales_cents,
                   COUNT(*) AS total_orders
            FROM orders
            WHERE status = 'completed' AND created_at >= $1 AND created_at <= $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesSummary {
            total_sales: Money::from_cents(row.try_get("total_sales_cents")?),
            total_orders: row.try_get::<i64, _>("total_orders")? as u64,
        })
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn insert_item(&self, item: CartItem) -> Result<CartItem> {
        let variant = item.variant.as_ref().map(serde_json::to_value).transpose()?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, variant, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CART_COLUMNS}
            "#
        ))
        .bind(item.id.as_uuid())
        .bind(item.user.as_uuid())
        .bind(item.product.as_str())
        .bind(variant)
        .bind(item.quantity as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_user_product")
            {
                return StoreError::DuplicateCartLine {
                    user: item.user.to_string(),
                    product: item.product.to_string(),
                };
            }
            StoreError::Database(e)
        })?;

        Self::row_to_cart_item(row)
    }

    async fn find_item(&self, id: CartItemId) -> Result<Option<CartItem>> {
        let row = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM cart_items WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn items_for_user(&self, user: UserId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_item).collect()
    }

    async fn find_item_by_product(
        &self,
        user: UserId,
        product: &ProductId,
    ) -> Result<Option<CartItem>> {
        let row = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 AND product_id = $2"
        ))
        .bind(user.as_uuid())
        .bind(product.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn update_item(
        &self,
        id: CartItemId,
        quantity: Option<u32>,
        variant: Option<ProductVariant>,
    ) -> Result<Option<CartItem>> {
        let variant = variant.as_ref().map(serde_json::to_value).transpose()?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE cart_items
            SET quantity = COALESCE($2, quantity),
                variant = COALESCE($3, variant),
                updated_at = now()
            WHERE id = $1
            RETURNING {CART_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(quantity.map(|q| q as i32))
        .bind(variant)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn delete_item(&self, id: CartItemId) -> Result<Option<CartItem>> {
        let row = sqlx::query(&format!(
            "DELETE FROM cart_items WHERE id = $1 RETURNING {CART_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn clear_user_cart(&self, user: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
