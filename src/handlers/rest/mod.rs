//! REST API.
//!
//! Public catalog and auth endpoints, plus bearer-protected cart, checkout
//! and order endpoints. Errors render as `{statusCode, error, message}`.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::TokenSigner;
use crate::config::Config;
use crate::services::{AuthService, CartService, CatalogService, CheckoutService, OrderService};
use crate::storage::Stores;
use crate::utils::bootstrap::shutdown_signal;

mod auth;
mod cart;
mod catalog;
mod checkout;
pub mod extract;
mod orders;

#[cfg(test)]
mod tests;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub carts: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    /// Wire every service over the given stores.
    pub fn new(stores: Stores, config: &Config) -> Self {
        let signer = TokenSigner::new(&config.auth.token_secret, config.auth.token_ttl_secs);

        Self {
            auth: Arc::new(AuthService::new(stores.users.clone(), signer)),
            carts: Arc::new(CartService::new(
                stores.carts.clone(),
                stores.catalog.clone(),
                config.checkout.enforce_single_restaurant,
            )),
            checkout: Arc::new(CheckoutService::new(
                stores.carts.clone(),
                stores.orders.clone(),
                stores.users,
                stores.catalog.clone(),
                config.checkout.delivery_fee,
            )),
            orders: Arc::new(OrderService::new(stores.orders)),
            catalog: Arc::new(CatalogService::new(stores.catalog, &config.catalog)),
        }
    }
}

/// Start the REST server on the configured address.
///
/// When the port is 0, the OS assigns an ephemeral port. The actual bound
/// port is always logged so it can be discovered.
pub async fn serve(
    state: AppState,
    address: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(address).await?;
    let local = listener.local_addr()?;
    info!(address = %local, port = local.port(), "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("REST API stopped");
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(cart::routes())
        .merge(checkout::routes())
        .merge(orders::routes())
        .merge(catalog::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> StatusCode {
    StatusCode::OK
}
