//! Business services behind the REST API.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

pub use auth::AuthService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use orders::OrderService;
