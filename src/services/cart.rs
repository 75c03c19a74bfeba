//! Cart manager.
//!
//! One cart per user, created on first add. Totals are recomputed from the
//! current rows on every read.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::interfaces::{CartLine, CartStore, CatalogStore, MAX_LINE_QUANTITY};

fn amount_too_large() -> AppError {
    AppError::validation("Cart amount is too large")
}

/// `price * quantity`, failing instead of wrapping.
pub(crate) fn line_subtotal(price: i64, quantity: i64) -> Result<i64> {
    price.checked_mul(quantity).ok_or_else(amount_too_large)
}

/// Sum of amounts, failing instead of wrapping.
pub(crate) fn checked_sum(amounts: impl IntoIterator<Item = i64>) -> Result<i64> {
    amounts
        .into_iter()
        .try_fold(0i64, i64::checked_add)
        .ok_or_else(amount_too_large)
}

/// One line of the cart view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItemView {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub subtotal: i64,
    pub image_url: String,
}

/// Cart contents with per-line subtotals and the grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: i64,
}

impl CartView {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn from_lines(lines: &[CartLine]) -> Result<Self> {
        let items = lines
            .iter()
            .map(|line| {
                Ok(CartItemView {
                    id: line.menu_item_id,
                    name: line.name.clone(),
                    price: line.price,
                    quantity: line.quantity,
                    subtotal: line_subtotal(line.price, line.quantity)?,
                    image_url: line.image_url.clone().unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<CartItemView>>>()?;
        let total = checked_sum(items.iter().map(|item| item.subtotal))?;

        Ok(Self { items, total })
    }
}

/// Confirmation returned by `clear`.
#[derive(Debug, Clone, Serialize)]
pub struct CartCleared {
    pub message: String,
}

fn check_menu_item_id(menu_item_id: i64) -> Result<()> {
    if menu_item_id < 1 {
        return Err(AppError::validation("menuItemId must be a positive integer"));
    }
    Ok(())
}

fn check_quantity_cap(quantity: i64) -> Result<()> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::validation(format!(
            "Quantity must not exceed {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

/// Cart operations for an authenticated user.
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    enforce_single_restaurant: bool,
}

impl CartService {
    pub fn new(
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogStore>,
        enforce_single_restaurant: bool,
    ) -> Self {
        Self {
            carts,
            catalog,
            enforce_single_restaurant,
        }
    }

    /// Current cart; empty when the user has never added anything.
    pub async fn get_cart(&self, user_id: i64) -> Result<CartView> {
        Ok(match self.carts.lines(user_id).await? {
            Some(lines) => CartView::from_lines(&lines)?,
            None => CartView::empty(),
        })
    }

    /// Add units of a menu item, incrementing an existing line.
    pub async fn add_to_cart(&self, user_id: i64, menu_item_id: i64, quantity: i64) -> Result<CartView> {
        check_menu_item_id(menu_item_id)?;
        if quantity < 1 {
            return Err(AppError::validation("Quantity must be at least 1"));
        }
        check_quantity_cap(quantity)?;

        if self.enforce_single_restaurant {
            self.check_same_restaurant(user_id, menu_item_id).await?;
        }

        self.carts.add_item(user_id, menu_item_id, quantity).await?;
        info!(user_id, menu_item_id, quantity, "added to cart");

        self.get_cart(user_id).await
    }

    /// Set a line to an exact quantity; zero removes it.
    pub async fn update_cart_item(
        &self,
        user_id: i64,
        menu_item_id: i64,
        quantity: i64,
    ) -> Result<CartView> {
        check_menu_item_id(menu_item_id)?;
        if quantity < 0 {
            return Err(AppError::validation("Quantity must not be negative"));
        }
        check_quantity_cap(quantity)?;

        self.carts.set_quantity(user_id, menu_item_id, quantity).await?;
        self.get_cart(user_id).await
    }

    pub async fn remove_from_cart(&self, user_id: i64, menu_item_id: i64) -> Result<CartView> {
        check_menu_item_id(menu_item_id)?;

        self.carts.remove_item(user_id, menu_item_id).await?;
        self.get_cart(user_id).await
    }

    pub async fn clear_cart(&self, user_id: i64) -> Result<CartCleared> {
        self.carts.clear(user_id).await?;
        Ok(CartCleared {
            message: "Cart cleared successfully".to_string(),
        })
    }

    async fn check_same_restaurant(&self, user_id: i64, menu_item_id: i64) -> Result<()> {
        let item = self
            .catalog
            .menu_item(menu_item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Menu item with ID {menu_item_id} not found")))?;

        let Some(lines) = self.carts.lines(user_id).await? else {
            return Ok(());
        };

        if let Some(other) = lines
            .iter()
            .find(|line| line.restaurant_id != item.restaurant_id)
        {
            warn!(
                user_id,
                menu_item_id,
                cart_restaurant = ?other.restaurant_id,
                item_restaurant = ?item.restaurant_id,
                "rejected item from a second restaurant"
            );
            return Err(AppError::Conflict(
                "Cart already contains items from another restaurant".to_string(),
            ));
        }
        Ok(())
    }
}
