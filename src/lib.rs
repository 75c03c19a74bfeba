//! Baemin - food delivery backend
//!
//! Restaurant catalog browsing, per-user carts, checkout into orders and
//! order status tracking, served as a JSON REST API over SQLite.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod interfaces;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
