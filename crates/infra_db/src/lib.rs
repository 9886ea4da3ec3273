//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the ledger, built on SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: one repository per table
//! (`customers`, `balances`, `sales_entries`, `cash_entries`), with
//! `PostgresLedgerStore` composing them behind the `LedgerStore` port of
//! `domain_ledger`.
//!
//! The schema lives in `migrations/` and is embedded at compile time;
//! `run_migrations` applies it.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/ledger")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresLedgerStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PostgresLedgerStore;
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
