//! Ledger store adapters shipped with the domain
//!
//! - **InMemoryLedgerStore**: process-local store, used for tests and for
//!   running the engine without a database
//!
//! The PostgreSQL adapter lives in `infra_db`.

pub mod memory;

pub use memory::{InMemoryLedgerStore, LedgerSnapshot};
