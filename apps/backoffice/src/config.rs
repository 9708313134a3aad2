//! # Store Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_DEFAULT_TAX_RATE_BPS=825                                 │
//! │     STOCKROOM_DATABASE__PATH=/var/lib/stockroom/stockroom.db           │
//! │                                                                         │
//! │  2. TOML Config File (optional)                                        │
//! │     ./stockroom.toml, or the path given with --config                  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! store_name = "Downtown Branch"
//! currency = "USD"
//! default_tax_rate_bps = 825   # 8.25%
//!
//! [database]
//! path = "./stockroom.db"
//! max_connections = 5
//! min_connections = 1
//!
//! [log]
//! format = "json"              # pretty | json
//! filter = "info,sqlx=warn"
//! ```

use config::{Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;
use stockroom_core::BasisPoints;
use stockroom_db::DbConfig;

const ENV_PREFIX: &str = "STOCKROOM";
const DEFAULT_FILE: &str = "stockroom";

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub store_name: String,
    /// ISO 4217 code, display only.
    pub currency: String,
    /// Applied to every new sale.
    pub default_tax_rate_bps: u32,
    pub database: DatabaseSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl StoreConfig {
    /// Defaults, then the optional TOML file, then `STOCKROOM_*` variables.
    pub fn load(file: Option<&str>) -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name(file.unwrap_or(DEFAULT_FILE)).required(file.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config: StoreConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with an inline TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = Self::defaults()?
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(config::Config::builder()
            .set_default("store_name", "Stockroom")?
            .set_default("currency", "USD")?
            .set_default("default_tax_rate_bps", 0)?
            .set_default("database.path", "./stockroom.db")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info,sqlx=warn")?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_tax_rate_bps > BasisPoints::FULL.bps() {
            return Err(ConfigError::TaxRateOutOfRange(self.default_tax_rate_bps));
        }

        if self.database.max_connections == 0
            || self.database.min_connections > self.database.max_connections
        {
            return Err(ConfigError::InvalidPool {
                min: self.database.min_connections,
                max: self.database.max_connections,
            });
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::InvalidValue("currency".to_string()));
        }

        Ok(())
    }

    pub fn tax_rate(&self) -> BasisPoints {
        BasisPoints::from_bps(self.default_tax_rate_bps)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Tax rate {0} bps exceeds 10000 bps (100%)")]
    TaxRateOutOfRange(u32),

    #[error("Invalid pool size: min {min}, max {max}")]
    InvalidPool { min: u32, max: u32 },

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_toml("").unwrap();
        assert_eq!(config.store_name, "Stockroom");
        assert_eq!(config.currency, "USD");
        assert!(config.tax_rate().is_zero());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = StoreConfig::from_toml(
            r#"
            store_name = "Downtown"
            default_tax_rate_bps = 825

            [database]
            path = "/tmp/downtown.db"
            max_connections = 2

            [log]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Downtown");
        assert_eq!(config.tax_rate().bps(), 825);
        assert_eq!(config.database.path, PathBuf::from("/tmp/downtown.db"));
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.db_config().max_connections, 2);
    }

    #[test]
    fn test_tax_rate_above_full_rejected() {
        let err = StoreConfig::from_toml("default_tax_rate_bps = 10001").unwrap_err();
        assert!(matches!(err, ConfigError::TaxRateOutOfRange(10001)));
    }

    #[test]
    fn test_pool_bounds_checked() {
        let err = StoreConfig::from_toml(
            r#"
            [database]
            max_connections = 1
            min_connections = 3
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPool { min: 3, max: 1 }));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let err = StoreConfig::from_toml("[log]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
