//! PostgreSQL pool setup for the ledger store
//!
//! Connections identify themselves as `ledger` in `pg_stat_activity`. Every
//! balance mutation holds a connection for the length of one short
//! transaction, so the pool is sized by expected concurrent writers.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use crate::error::DatabaseError;

pub type DatabasePool = PgPool;

const APPLICATION_NAME: &str = "ledger";

/// Pool settings
///
/// ```rust
/// use infra_db::DatabaseConfig;
///
/// let config = DatabaseConfig::new("postgres://localhost/ledger").max_connections(4);
/// assert_eq!(config.max_connections, 4);
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a caller waits for a free connection before the request
    /// fails with `PoolExhausted`
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn connect_options(&self) -> Result<PgConnectOptions, DatabaseError> {
        let options = PgConnectOptions::from_str(&self.url)
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Invalid database URL: {}", e)))?;
        Ok(options.application_name(APPLICATION_NAME))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("postgres://localhost/ledger")
    }
}

/// Connects a pool, failing fast if the server cannot be reached
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    let options = config.connect_options()?;
    info!(max_connections = config.max_connections, "Connecting ledger database pool");

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

pub async fn create_pool_from_url(url: &str) -> Result<DatabasePool, DatabaseError> {
    create_pool(DatabaseConfig::new(url)).await
}

/// Applies the embedded schema migrations. Already applied migrations are
/// skipped.
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    let migrator = sqlx::migrate!("./migrations");
    info!(migrations = migrator.iter().count(), "Applying ledger schema");
    migrator.run(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_never_sized_to_zero() {
        let config = DatabaseConfig::new("postgres://db/ledger").max_connections(0);
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn test_connect_options_carry_application_name() {
        let options = DatabaseConfig::new("postgres://user:pw@db:5433/ledger")
            .connect_options()
            .unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("ledger"));
        assert_eq!(options.get_application_name(), Some(APPLICATION_NAME));
    }

    #[test]
    fn test_malformed_url_is_a_connection_error() {
        let error = DatabaseConfig::new("not a url").connect_options().unwrap_err();
        assert!(error.is_connection_error());
    }
}
