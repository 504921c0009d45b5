//! Cart workflows.

use common::{CartItemId, ProductId, UserId};
use domain::{CartError, CartItem, ProductVariant};
use order_store::CartStore;

use crate::error::{OrdersError, Result};

/// Service managing a user's cart lines.
///
/// A cart holds at most one line per `(user, product)` pair; adding a
/// product that is already in the cart increments the existing line's
/// quantity instead of duplicating it.
pub struct CartService<S> {
    store: S,
}

impl<S: CartStore> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a product to the user's cart, or increments the quantity of
    /// the existing line for that product.
    #[tracing::instrument(skip(self, variant))]
    pub async fn add_item(
        &self,
        user: UserId,
        product: ProductId,
        variant: Option<ProductVariant>,
        quantity: u32,
    ) -> Result<CartItem> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        if let Some(existing) = self.store.find_item_by_product(user, &product).await? {
            let updated = self
                .store
                .update_item(existing.id, Some(existing.quantity + quantity), None)
                .await?;
            if let Some(line) = updated {
                tracing::debug!(cart_item = %line.id, quantity = line.quantity, "cart line incremented");
                return Ok(line);
            }
            // The line vanished between the lookup and the update; fall
            // through and insert a fresh one.
        }

        let item = CartItem::new(user, product, variant, quantity)?;
        let item = self.store.insert_item(item).await?;
        tracing::debug!(cart_item = %item.id, "cart line added");
        Ok(item)
    }

    /// Returns the user's cart lines, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user: UserId) -> Result<Vec<CartItem>> {
        Ok(self.store.items_for_user(user).await?)
    }

    /// Updates a cart line's quantity and/or variant.
    #[tracing::instrument(skip(self, variant))]
    pub async fn update_item(
        &self,
        id: CartItemId,
        quantity: Option<u32>,
        variant: Option<ProductVariant>,
    ) -> Result<CartItem> {
        if let Some(0) = quantity {
            return Err(CartError::InvalidQuantity { quantity: 0 }.into());
        }

        self.store
            .update_item(id, quantity, variant)
            .await?
            .ok_or(OrdersError::CartItemNotFound(id))
    }

    /// Removes a single cart line.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, id: CartItemId) -> Result<CartItem> {
        self.store
            .delete_item(id)
            .await?
            .ok_or(OrdersError::CartItemNotFound(id))
    }

    /// Removes every line in the user's cart, returning how many were
    /// removed.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, user: UserId) -> Result<u64> {
        Ok(self.store.clear_user_cart(user).await?)
    }
}
