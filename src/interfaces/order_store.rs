//! Order storage interface.

use async_trait::async_trait;

use super::Result;

/// One frozen line of an order about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub item_id: i64,
    pub quantity: i64,
    pub price: i64,
}

/// Everything needed to write an order in one transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub restaurant_id: i64,
    pub total_amount: i64,
    pub status: String,
    pub payment_method_id: i64,
    pub payment_status: String,
    pub delivery_instructions: Option<String>,
    pub lines: Vec<NewOrderLine>,
    pub created_at: String,
}

/// Result of a committed checkout.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub status: String,
    pub total_amount: i64,
    pub created_at: String,
    pub restaurant_id: i64,
}

/// Order line joined with the menu item name.
#[derive(Debug, Clone)]
pub struct OrderLineRecord {
    pub item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: i64,
}

/// Order joined with restaurant, customer and payment data.
#[derive(Debug, Clone)]
pub struct OrderDetailsRecord {
    pub order_id: i64,
    pub user_id: i64,
    pub status: String,
    pub restaurant_name: Option<String>,
    pub total_amount: i64,
    pub payment_method: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_instructions: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderLineRecord>,
}

/// Status row after an update.
#[derive(Debug, Clone)]
pub struct OrderStatusRecord {
    pub order_id: i64,
    pub status: String,
    pub updated_at: String,
}

/// Interface for order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Write the order, its lines and its payment, then empty the user's cart.
    ///
    /// All of it happens in one transaction: on any failure nothing is
    /// written and the cart is left as it was. The delivery address is the
    /// user's stored address at the moment of the write.
    ///
    /// `order.lines` must equal the cart as it is when the transaction takes
    /// the write lock, in cart order. Otherwise it fails with `Conflict` and
    /// the caller should re-read the cart. Fails with `NotFound` when the user
    /// has no cart.
    async fn place_order(&self, order: NewOrder) -> Result<PlacedOrder>;

    /// Load an order with its joined display data.
    async fn details(&self, order_id: i64) -> Result<Option<OrderDetailsRecord>>;

    /// Current status of an order, `None` when it does not exist.
    async fn status(&self, order_id: i64) -> Result<Option<String>>;

    /// Overwrite the status field. Fails with `NotFound` for unknown orders.
    async fn update_status(
        &self,
        order_id: i64,
        status: &str,
        updated_at: &str,
    ) -> Result<OrderStatusRecord>;
}
