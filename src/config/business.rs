//! Auth, checkout and catalog configuration types.

use serde::Deserialize;

/// Signing secret used when none is configured. Only fit for development.
pub const DEV_TOKEN_SECRET: &str = "baemin-dev-secret-change-me";

/// Bearer token configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key for access tokens.
    pub token_secret: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: DEV_TOKEN_SECRET.to_string(),
            token_ttl_secs: 86_400,
        }
    }
}

impl AuthConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.token_secret == DEV_TOKEN_SECRET
    }
}

/// Checkout configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Flat delivery fee added to every order, in VND.
    pub delivery_fee: i64,
    /// Reject adding items from a second restaurant to a cart.
    pub enforce_single_restaurant: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            delivery_fee: 38_000,
            enforce_single_restaurant: false,
        }
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Service charge shown on restaurant details.
    pub service_charge: f64,
    /// Upper bound for `limit` on paginated endpoints.
    pub max_page_size: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            service_charge: 0.8,
            max_page_size: 50,
        }
    }
}
