//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CartItemId;
use domain::{CartItem, ProductVariant};
use order_store::{CartStore, OrderStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::{AppState, parse_user_id};

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub user: Option<String>,
    pub product: Option<String>,
    #[serde(default, rename = "product_variant")]
    pub variant: Option<ProductVariant>,
    pub quantity: Option<u32>,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: Option<u32>,
    #[serde(default, rename = "product_variant")]
    pub variant: Option<ProductVariant>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: String,
    pub user: String,
    pub product: String,
    #[serde(rename = "product_variant", skip_serializing_if = "Option::is_none")]
    pub variant: Option<ProductVariant>,
    pub quantity: u32,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl CartItemResponse {
    fn from_item(item: CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            user: item.user.to_string(),
            product: item.product.to_string(),
            variant: item.variant,
            quantity: item.quantity,
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct CartItemEnvelope {
    pub success: bool,
    pub message: String,
    pub cart: CartItemResponse,
}

#[derive(Serialize)]
pub struct CartEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(rename = "cartItems")]
    pub cart_items: Vec<CartItemResponse>,
}

#[derive(Serialize)]
pub struct CartClearedEnvelope {
    pub success: bool,
    pub message: String,
    pub removed: u64,
}

// -- Handlers --

/// POST /cart/add — add a product to the cart or increment the existing
/// line.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItemEnvelope>), ApiError> {
    let (Some(user), Some(product), Some(quantity)) = (req.user, req.product, req.quantity) else {
        return Err(ApiError::BadRequest(
            "User, product, and quantity are required".to_string(),
        ));
    };

    let user = parse_user_id(&user)?;
    let item = state
        .cart
        .add_item(user, product.into(), req.variant, quantity)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CartItemEnvelope {
            success: true,
            message: "Item added to cart".to_string(),
            cart: CartItemResponse::from_item(item),
        }),
    ))
}

/// GET /cart/{user_id} — the user's cart lines.
#[tracing::instrument(skip(state))]
pub async fn get_cart<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<CartEnvelope>, ApiError> {
    let user = parse_user_id(&user_id)?;
    let items = state.cart.get_cart(user).await?;

    Ok(Json(CartEnvelope {
        success: true,
        message: "Cart fetched successfully".to_string(),
        cart_items: items.into_iter().map(CartItemResponse::from_item).collect(),
    }))
}

/// PATCH /cart/item/{id} — update a cart line's quantity or variant.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartItemEnvelope>, ApiError> {
    let id = parse_cart_item_id(&id)?;
    let item = state
        .cart
        .update_item(id, req.quantity, req.variant)
        .await?;

    Ok(Json(CartItemEnvelope {
        success: true,
        message: "Cart item updated".to_string(),
        cart: CartItemResponse::from_item(item),
    }))
}

/// DELETE /cart/item/{id} — remove one cart line.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CartItemEnvelope>, ApiError> {
    let id = parse_cart_item_id(&id)?;
    let item = state.cart.remove_item(id).await?;

    Ok(Json(CartItemEnvelope {
        success: true,
        message: "Cart item deleted".to_string(),
        cart: CartItemResponse::from_item(item),
    }))
}

/// DELETE /cart/clear/{user_id} — remove every line in the user's cart.
#[tracing::instrument(skip(state))]
pub async fn clear<S: OrderStore + CartStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<CartClearedEnvelope>, ApiError> {
    let user = parse_user_id(&user_id)?;
    let removed = state.cart.clear_cart(user).await?;

    Ok(Json(CartClearedEnvelope {
        success: true,
        message: "Cart cleared".to_string(),
        removed,
    }))
}

fn parse_cart_item_id(id: &str) -> Result<CartItemId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid cart item ID: {e}")))?;
    Ok(CartItemId::from_uuid(uuid))
}
