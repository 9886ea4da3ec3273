//! Ledger configuration

use core_kernel::{BusinessCalendar, Timezone};
use infra_db::DatabaseConfig;
use serde::Deserialize;

/// Environment variable prefix, e.g. `LEDGER_STORE=postgres`
pub const ENV_PREFIX: &str = "LEDGER";

/// Which `LedgerStore` implementation to wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Postgres,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Store backend
    pub store: StoreKind,
    /// PostgreSQL URL, used when `store` is `postgres`
    pub database_url: String,
    /// Pool size for the PostgreSQL store
    pub max_connections: u32,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// IANA timezone whose midnight starts a business day
    pub business_timezone: Timezone,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Memory,
            database_url: "postgres://localhost/ledger".to_string(),
            max_connections: 10,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            business_timezone: Timezone::default(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from `LEDGER_*` environment variables
    ///
    /// A `.env` file in the working directory is read first when present.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from an explicit environment source
    pub fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("store", "memory")?
            .set_default("database_url", defaults.database_url)?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "pretty")?
            .set_default("business_timezone", "UTC")?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Pool settings for the PostgreSQL store
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url).max_connections(self.max_connections)
    }

    pub fn calendar(&self) -> BusinessCalendar {
        BusinessCalendar::new(self.business_timezone)
    }
}
