//! Port Adapters
//!
//! Implementations of domain ports backed by the PostgreSQL repositories.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::LedgerStore;
//!
//! let store = PostgresLedgerStore::new(pool);
//! let balance = store.get_balance("K K").await?;
//! ```

pub mod ledger;

pub use ledger::PostgresLedgerStore;
