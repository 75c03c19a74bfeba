//! Cart storage interface.

use async_trait::async_trait;

use super::Result;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// One cart line joined with its menu item.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub menu_item_id: i64,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub image_url: Option<String>,
    /// Owning restaurant of the menu item, if the item still has one.
    pub restaurant_id: Option<i64>,
}

/// Interface for cart persistence.
///
/// Every mutating method runs in its own transaction. Menu items are only
/// read, never written.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load the lines of a user's cart.
    ///
    /// Returns `None` when the user has never had a cart, and an empty vector
    /// when the cart exists but holds no items.
    async fn lines(&self, user_id: i64) -> Result<Option<Vec<CartLine>>>;

    /// Add `quantity` units of a menu item, creating the cart if needed.
    ///
    /// An existing line is incremented with a single atomic statement.
    /// Fails with `NotFound` when the menu item does not exist and with
    /// `Invalid` when the line would exceed [`MAX_LINE_QUANTITY`].
    async fn add_item(&self, user_id: i64, menu_item_id: i64, quantity: i64) -> Result<()>;

    /// Set the exact quantity of a line; zero deletes it.
    ///
    /// Fails with `NotFound` when the user has no cart and with `Invalid`
    /// when `quantity` is above [`MAX_LINE_QUANTITY`].
    async fn set_quantity(&self, user_id: i64, menu_item_id: i64, quantity: i64) -> Result<()>;

    /// Delete one line. Absent lines are ignored.
    ///
    /// Fails with `NotFound` when the user has no cart.
    async fn remove_item(&self, user_id: i64, menu_item_id: i64) -> Result<()>;

    /// Delete every line of the user's cart. No-op when there is no cart.
    async fn clear(&self, user_id: i64) -> Result<()>;
}
