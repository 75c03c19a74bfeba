//! baemin-server: food delivery REST API
//!
//! ## Configuration
//! - `--config <path>` or BAEMIN_CONFIG: YAML configuration file
//! - BAEMIN__SERVER__PORT, BAEMIN__STORAGE__PATH, BAEMIN__AUTH__TOKEN_SECRET, ...:
//!   per-field overrides
//! - BAEMIN_LOG: tracing filter (default "info")

use tracing::{error, info, warn};

use baemin::config::Config;
use baemin::handlers::rest::{serve, AppState};
use baemin::storage::init_storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    baemin::utils::bootstrap::init_tracing();

    let config_path = baemin::utils::bootstrap::parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting baemin-server");

    if config.auth.uses_dev_secret() {
        warn!("auth.token_secret is the development default; set BAEMIN__AUTH__TOKEN_SECRET");
    }

    let stores = init_storage(&config.storage).await?;
    info!("Storage initialized");

    let state = AppState::new(stores, &config);
    serve(state, &config.server.bind_address()).await
}
