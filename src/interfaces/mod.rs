//! Abstract interfaces for the delivery backend.
//!
//! These traits define the contracts for:
//! - User accounts (signup, login lookups, contact details)
//! - Carts (per-user line items)
//! - Orders (atomic checkout, status, details)
//! - Catalog (restaurants, menus, categories, banners, reviews)

pub mod cart_store;
pub mod catalog_store;
pub mod order_store;
pub mod user_store;

pub use cart_store::{CartLine, CartStore, MAX_LINE_QUANTITY};
pub use catalog_store::{
    Banner, CatalogStore, FoodCategory, MenuItem, PaymentMethod, Restaurant, RestaurantFilter,
    ReviewRecord, Submenu,
};
pub use order_store::{
    NewOrder, NewOrderLine, OrderDetailsRecord, OrderLineRecord, OrderStatusRecord, OrderStore,
    PlacedOrder,
};
pub use user_store::{NewUser, UserRecord, UserStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A write would break a data limit, such as the per-line quantity cap.
    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}
