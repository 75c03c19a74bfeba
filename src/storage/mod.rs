//! Storage implementations.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::interfaces::{CartStore, CatalogStore, OrderStore, Result, UserStore};

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteCartStore, SqliteCatalogStore, SqliteOrderStore, SqliteUserStore};

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub path: String,
    /// Connection pool size.
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./data/baemin.db".to_string(),
            max_connections: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

/// All stores, sharing one pool.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub catalog: Arc<dyn CatalogStore>,
}

impl Stores {
    /// Build the SQLite stores over an already migrated pool.
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            users: Arc::new(SqliteUserStore::new(pool.clone())),
            carts: Arc::new(SqliteCartStore::new(pool.clone())),
            orders: Arc::new(SqliteOrderStore::new(pool.clone())),
            catalog: Arc::new(SqliteCatalogStore::new(pool)),
        }
    }
}

/// Open the database, apply migrations and build the stores.
pub async fn init_storage(config: &StorageConfig) -> Result<Stores> {
    info!(path = %config.path, "opening storage");

    let pool = connect(config).await?;
    migrate(&pool).await?;

    Ok(Stores::sqlite(pool))
}

/// Open a pool with foreign keys enforced on every connection.
pub async fn connect(config: &StorageConfig) -> Result<SqlitePool> {
    let in_memory = config.path == ":memory:";

    if !in_memory {
        if let Some(parent) = std::path::Path::new(&config.path).parent() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
    }

    let mut options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // Each in-memory connection is a separate database, so the pool must
    // hold exactly one connection and never recycle it.
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    Ok(pool_options.connect_with(options).await?)
}

/// Apply the embedded migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("migrations/sqlite").run(pool).await?;
    Ok(())
}
