//! Application configuration.
//!
//! Aggregates the per-module sections into a single Config struct that can
//! be loaded from YAML files or environment variables.

mod business;
mod server;

pub use business::{AuthConfig, CatalogConfig, CheckoutConfig, DEV_TOKEN_SECRET};
pub use server::ServerConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "BAEMIN_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "BAEMIN";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "BAEMIN_LOG";

use serde::Deserialize;

use crate::storage::StorageConfig;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener.
    pub server: ServerConfig,
    /// SQLite database.
    pub storage: StorageConfig,
    /// Token signing and lifetime.
    pub auth: AuthConfig,
    /// Delivery fee and cart rules.
    pub checkout: CheckoutConfig,
    /// Restaurant details and paging limits.
    pub catalog: CatalogConfig,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no request could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "catalog.max_page_size must be at least 1".to_string(),
            ));
        }
        if self.checkout.delivery_fee < 0 {
            return Err(ConfigError::Invalid(
                "checkout.delivery_fee must not be negative".to_string(),
            ));
        }
        if self.auth.token_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.token_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create config for testing: in-memory database, defaults elsewhere.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                path: ":memory:".to_string(),
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.path, "./data/baemin.db");
        assert_eq!(config.checkout.delivery_fee, 38_000);
        assert!(!config.checkout.enforce_single_restaurant);
        assert_eq!(config.catalog.max_page_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_for_test() {
        let config = Config::for_test();
        assert_eq!(config.storage.path, ":memory:");
        assert_eq!(config.auth.token_ttl_secs, 86_400);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  port: 9000

storage:
  path: /tmp/baemin-test.db
  max_connections: 2

auth:
  token_secret: not-the-default
  token_ttl_secs: 60

checkout:
  delivery_fee: 15000
  enforce_single_restaurant: true

catalog:
  service_charge: 1.5
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.path, "/tmp/baemin-test.db");
        assert_eq!(config.storage.max_connections, 2);
        assert_eq!(config.auth.token_ttl_secs, 60);
        assert_eq!(config.checkout.delivery_fee, 15_000);
        assert!(config.checkout.enforce_single_restaurant);
        assert_eq!(config.catalog.service_charge, 1.5);
        assert_eq!(config.catalog.max_page_size, 50);
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.catalog.max_page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baemin.yaml");
        std::fs::write(&path, "checkout:\n  delivery_fee: 20000\n").unwrap();

        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.checkout.delivery_fee, 20_000);
    }
}
