//! # Application Configuration
//!
//! Settings for the database, ledger policy, reports and store display.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     INVENTA_DB_PATH=/srv/inventa/inventa.db                            │
//! │     INVENTA_RETURN_PRICING=sale_price                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/inventa/inventa.toml (Linux)                             │
//! │     ~/Library/Application Support/com.inventa.inventa/inventa.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # inventa.toml
//! [database]
//! path = "/srv/inventa/inventa.db"
//! max_connections = 5
//!
//! [ledger]
//! return_pricing = "current_price"   # current_price | sale_price
//! sale_deletion = "allow"            # allow | reject_with_returns
//!
//! [reports]
//! top_products = 10
//! chart_days = 30
//!
//! [store]
//! name = "Corner Shop"
//! currency_symbol = "Q"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use inventa_core::ledger::LedgerPolicy;
use inventa_core::Money;

use crate::error::DbResult;
use crate::pool::{Database, DbConfig};
use crate::reports::ReportSettings;

const CONFIG_FILE_NAME: &str = "inventa.toml";

// =============================================================================
// Errors
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting has an unusable value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The config file could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    ConfigLoadFailed(String),

    /// The config file could not be written.
    #[error("Failed to save configuration: {0}")]
    ConfigSaveFailed(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::ConfigSaveFailed(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "inventa", "inventa")
        .map(|dirs| dirs.data_dir().join("inventa.db"))
        .unwrap_or_else(|| PathBuf::from("inventa.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[store]` section: display-only details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Prefix used when formatting amounts for people.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_store_name() -> String {
    "Inventa Store".to_string()
}

fn default_currency_symbol() -> String {
    "Q".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub ledger: LedgerPolicy,

    #[serde(default)]
    pub reports: ReportSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`inventa.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig("database.path must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.reports.top_products == 0 {
            return Err(ConfigError::InvalidConfig(
                "reports.top_products must be greater than 0".into(),
            ));
        }
        if self.reports.chart_days == 0 {
            return Err(ConfigError::InvalidConfig(
                "reports.chart_days must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Applies `INVENTA_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("INVENTA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("INVENTA_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring INVENTA_MAX_CONNECTIONS"),
            }
        }

        if let Some(pricing) = lookup("INVENTA_RETURN_PRICING") {
            match pricing.parse() {
                Ok(parsed) => {
                    debug!(pricing = %pricing, "Overriding return pricing from environment");
                    self.ledger.return_pricing = parsed;
                }
                Err(e) => warn!(value = %pricing, error = %e, "Ignoring INVENTA_RETURN_PRICING"),
            }
        }

        if let Some(deletion) = lookup("INVENTA_SALE_DELETION") {
            match deletion.parse() {
                Ok(parsed) => self.ledger.sale_deletion = parsed,
                Err(e) => warn!(value = %deletion, error = %e, "Ignoring INVENTA_SALE_DELETION"),
            }
        }

        if let Some(symbol) = lookup("INVENTA_CURRENCY_SYMBOL") {
            self.store.currency_symbol = symbol;
        }

        if let Some(top) = lookup("INVENTA_TOP_PRODUCTS") {
            match top.parse::<usize>() {
                Ok(n) => self.reports.top_products = n,
                Err(_) => warn!(value = %top, "Ignoring INVENTA_TOP_PRODUCTS"),
            }
        }

        if let Some(days) = lookup("INVENTA_CHART_DAYS") {
            match days.parse::<u32>() {
                Ok(n) => self.reports.chart_days = n,
                Err(_) => warn!(value = %days, "Ignoring INVENTA_CHART_DAYS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "inventa", "inventa")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pool configuration for [`Database::new`].
    pub fn db_config(&self) -> DbConfig {
        let config = DbConfig::new(self.database.path.clone());
        if config.is_in_memory() {
            DbConfig::in_memory()
        } else {
            config.max_connections(self.database.max_connections)
        }
    }

    /// Opens the database with this configuration's policy and settings.
    pub async fn open_database(&self) -> DbResult<Database> {
        if let Some(parent) = self.database.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| crate::error::DbError::ConnectionFailed(e.to_string()))?;
            }
        }

        Ok(Database::new(self.db_config())
            .await?
            .with_ledger_policy(self.ledger)
            .with_report_settings(self.reports))
    }

    /// Formats an amount with the store's currency symbol.
    pub fn format_money(&self, amount: Money) -> String {
        amount.display_with(&self.store.currency_symbol)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
