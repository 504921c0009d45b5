//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Datelike;
use common::{OrderNumber, UserId};
use domain::{ClaimedTotals, Money, Order, OrderItem, OrderStatus, ProductVariant};
use order_store::{CartStore, OrderStore, SortDirection, SortField};
use orders::{CartService, NewOrder, OrderListRequest, OrderService, TransitionPolicy};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub orders: OrderService<S>,
    pub cart: CartService<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
    pub total_amount: Option<f64>,
    pub discount_amount: Option<f64>,
    pub gross_amount: Option<f64>,
    pub shipping_amount: Option<f64>,
    pub net_amount: Option<f64>,
    #[serde(rename = "selectedAddress")]
    pub selected_address: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub variant: Option<ProductVariant>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    /// Distinct operator capability: skip the transition graph.
    #[serde(default, rename = "override")]
    pub override_transition: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    /// RFC 3339 lower bound on creation time.
    pub created_from: Option<String>,
    /// RFC 3339 upper bound on creation time.
    pub created_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlySalesParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<ProductVariant>,
}

/// Wire shape of an order, matching the JSON the storefront consumes.
#[derive(Serialize)]
pub struct OrderResponse {
    pub order_number: String,
    pub user: String,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: f64,
    pub discount_amount: f64,
    pub gross_amount: f64,
    pub shipping_amount: f64,
    pub net_amount: f64,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(rename = "paymentStatus")]
    pub payment_status: String,
    pub status: String,
    #[serde(rename = "selectedAddress")]
    pub selected_address: serde_json::Value,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl OrderResponse {
    fn from_order(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price.as_f64(),
                variant: item.variant.clone(),
            })
            .collect();

        Self {
            order_number: order.order_number.to_string(),
            user: order.user.to_string(),
            items,
            total_amount: order.totals.total_amount.as_f64(),
            discount_amount: order.totals.discount_amount.as_f64(),
            gross_amount: order.totals.gross_amount.as_f64(),
            shipping_amount: order.totals.shipping_amount.as_f64(),
            net_amount: order.totals.net_amount.as_f64(),
            payment_method: order.payment_method.to_string(),
            payment_status: order.payment_status.to_string(),
            status: order.status.to_string(),
            selected_address: order.selected_address,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderEnvelope {
    pub success: bool,
    pub message: String,
    pub order: OrderResponse,
}

#[derive(Serialize)]
pub struct OrdersEnvelope {
    pub success: bool,
    pub message: String,
    pub orders: Vec<OrderResponse>,
}

#[derive(Serialize)]
pub struct PaginatedOrdersEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(rename = "currentPage")]
    pub current_page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "totalOrders")]
    pub total_orders: u64,
    pub data: Vec<OrderResponse>,
}

#[derive(Serialize)]
pub struct MonthlySalesEnvelope {
    pub success: bool,
    pub month: String,
    #[serde(rename = "totalSales")]
    pub total_sales: f64,
    #[serde(rename = "totalOrders")]
    pub total_orders: u64,
}

// -- Handlers --

/// POST /order/create — create an order from a cart-derived request.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderEnvelope>), ApiError> {
    let (Some(user), Some(items), Some(total), Some(gross), Some(net), Some(address)) = (
        req.user,
        req.items,
        req.total_amount,
        req.gross_amount,
        req.net_amount,
        req.selected_address,
    ) else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    let user = parse_user_id(&user)?;
    let items: Vec<OrderItem> = items
        .into_iter()
        .map(|item| OrderItem {
            product_id: item.product_id.into(),
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price: Money::from_f64(item.unit_price),
            variant: item.variant,
        })
        .collect();

    let claimed = ClaimedTotals {
        total_amount: Money::from_f64(total),
        discount_amount: Money::from_f64(req.discount_amount.unwrap_or(0.0)),
        gross_amount: Money::from_f64(gross),
        shipping_amount: Money::from_f64(req.shipping_amount.unwrap_or(0.0)),
        net_amount: Money::from_f64(net),
    };

    let order = state
        .orders
        .create_order(NewOrder {
            user,
            items,
            claimed,
            selected_address: address,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderEnvelope {
            success: true,
            message: "Order created successfully".to_string(),
            order: OrderResponse::from_order(order),
        }),
    ))
}

/// GET /order/user/{user_id} — all orders owned by a user.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<OrdersEnvelope>, ApiError> {
    let user = parse_user_id(&user_id)?;
    let orders = state.orders.list_orders_by_user(user).await?;

    Ok(Json(OrdersEnvelope {
        success: true,
        message: "Orders fetched successfully".to_string(),
        orders: orders.into_iter().map(OrderResponse::from_order).collect(),
    }))
}

/// PATCH /order/cancel/{order_number}/{user_id} — owner-initiated
/// cancellation.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_number, user_id)): Path<(String, String)>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let user = parse_user_id(&user_id)?;
    let order = state
        .orders
        .cancel_order(&OrderNumber::new(order_number), user)
        .await?;

    Ok(Json(OrderEnvelope {
        success: true,
        message: "Order cancelled successfully".to_string(),
        order: OrderResponse::from_order(order),
    }))
}

/// PUT /order/{order_number}/status — administrative status update.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_number): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let Some(status) = req.status else {
        return Err(ApiError::BadRequest("Invalid status value".to_string()));
    };
    let status: OrderStatus = status.parse().map_err(orders::OrdersError::from)?;

    let policy = if req.override_transition {
        TransitionPolicy::Override
    } else {
        TransitionPolicy::Enforced
    };

    let order = state
        .orders
        .update_status(&OrderNumber::new(order_number), status, policy)
        .await?;

    Ok(Json(OrderEnvelope {
        success: true,
        message: "Order status updated successfully".to_string(),
        order: OrderResponse::from_order(order),
    }))
}

/// DELETE /order/{order_number} — administrative hard delete.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let order = state
        .orders
        .delete_order(&OrderNumber::new(order_number))
        .await?;

    Ok(Json(OrderEnvelope {
        success: true,
        message: "Order deleted".to_string(),
        order: OrderResponse::from_order(order),
    }))
}

/// GET /order/all — paginated administrative listing.
#[tracing::instrument(skip(state))]
pub async fn list_all<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<PaginatedOrdersEnvelope>, ApiError> {
    let status = params
        .status
        .map(|s| s.parse::<OrderStatus>().map_err(orders::OrdersError::from))
        .transpose()?;
    let created_from = params.created_from.map(|s| parse_instant(&s)).transpose()?;
    let created_to = params.created_to.map(|s| parse_instant(&s)).transpose()?;
    let sort_by = params.sort_by.map(parse_sort_field).transpose()?;
    let sort_dir = params.sort_dir.map(parse_sort_dir).transpose()?;

    let page = state
        .orders
        .list_orders(OrderListRequest {
            status,
            created_from,
            created_to,
            sort_by: sort_by.unwrap_or_default(),
            sort_dir: sort_dir.unwrap_or_default(),
            page: params.page.unwrap_or(1),
            limit: params.limit.unwrap_or(10),
            ..Default::default()
        })
        .await?;

    Ok(Json(PaginatedOrdersEnvelope {
        success: true,
        message: "Orders fetched successfully".to_string(),
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_orders: page.total_orders,
        data: page
            .orders
            .into_iter()
            .map(OrderResponse::from_order)
            .collect(),
    }))
}

/// GET /order/sales/monthly — completed-order sales for a calendar
/// month, defaulting to the current UTC month.
#[tracing::instrument(skip(state))]
pub async fn monthly_sales<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<MonthlySalesParams>,
) -> Result<Json<MonthlySalesEnvelope>, ApiError> {
    let now = chrono::Utc::now();
    let year = params.year.unwrap_or_else(|| now.year());
    let month = params.month.unwrap_or_else(|| now.month());

    let sales = state.orders.monthly_sales(year, month).await?;

    Ok(Json(MonthlySalesEnvelope {
        success: true,
        month: sales.month.to_string(),
        total_sales: sales.total_sales.as_f64(),
        total_orders: sales.total_orders,
    }))
}

pub(crate) fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid user ID: {e}")))?;
    Ok(UserId::from_uuid(uuid))
}

fn parse_instant(s: &str) -> Result<chrono::DateTime<chrono::Utc>, ApiError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| ApiError::BadRequest(format!("Invalid timestamp: {e}")))
}

fn parse_sort_field(s: String) -> Result<SortField, ApiError> {
    match s.as_str() {
        "created_at" => Ok(SortField::CreatedAt),
        "updated_at" => Ok(SortField::UpdatedAt),
        "net_amount" => Ok(SortField::NetAmount),
        "status" => Ok(SortField::Status),
        other => Err(ApiError::BadRequest(format!(
            "Invalid sort field: {other:?}"
        ))),
    }
}

fn parse_sort_dir(s: String) -> Result<SortDirection, ApiError> {
    match s.as_str() {
        "asc" => Ok(SortDirection::Asc),
        "desc" => Ok(SortDirection::Desc),
        other => Err(ApiError::BadRequest(format!(
            "Invalid sort direction: {other:?}"
        ))),
    }
}
