//! Ledger Composition Root
//!
//! Wires a `LedgerService` from configuration: reads `LEDGER_*` settings,
//! installs tracing, and selects the in-memory or PostgreSQL store.
//!
//! # Example
//!
//! ```rust,ignore
//! use ledger_app::LedgerApp;
//!
//! let app = LedgerApp::bootstrap().await?;
//! let report = app.service().customers().balance_report().await?;
//! ```

pub mod config;
pub mod error;
pub mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use core_kernel::HealthCheckResult;
use domain_ledger::adapters::InMemoryLedgerStore;
use domain_ledger::{LedgerService, LedgerStore};
use infra_db::{create_pool, run_migrations, PostgresLedgerStore};
use tracing::info;

use crate::config::{LedgerConfig, StoreKind};

pub use crate::error::{AppError, ErrorClass, ErrorResponse};

/// A configured ledger
pub struct LedgerApp {
    config: LedgerConfig,
    service: LedgerService,
}

impl LedgerApp {
    /// Loads configuration from the environment, installs tracing and
    /// wires the configured store
    pub async fn bootstrap() -> anyhow::Result<Self> {
        let config = LedgerConfig::from_env().context("Failed to load ledger configuration")?;
        telemetry::init_tracing(&config)?;
        Self::from_config(config).await
    }

    /// Wires the store named by `config`
    ///
    /// For PostgreSQL this connects the pool and applies migrations.
    pub async fn from_config(config: LedgerConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn LedgerStore> = match config.store {
            StoreKind::Memory => {
                info!("Using in-memory ledger store");
                Arc::new(InMemoryLedgerStore::new())
            }
            StoreKind::Postgres => {
                let pool = create_pool(config.database_config())
                    .await
                    .context("Failed to connect to the ledger database")?;
                run_migrations(&pool)
                    .await
                    .context("Failed to apply ledger migrations")?;
                info!(max_connections = config.max_connections, "Using PostgreSQL ledger store");
                Arc::new(PostgresLedgerStore::new(pool))
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Wires an already constructed store
    pub fn with_store(config: LedgerConfig, store: Arc<dyn LedgerStore>) -> Self {
        let service = LedgerService::new(store, config.calendar());
        Self { config, service }
    }

    pub fn service(&self) -> &LedgerService {
        &self.service
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Health of the wired store
    pub async fn health(&self) -> HealthCheckResult {
        self.service.health().await
    }
}
