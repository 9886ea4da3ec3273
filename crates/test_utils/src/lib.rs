//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed dates, customers and the worked example ledger
//! - `builders`: Builders for seeded in-memory ledgers and persisted entries
//! - `database`: PostgreSQL test containers with the ledger schema applied
//! - `assertions`: Balance and bill consistency assertions
//! - `generators`: Property-based and fake data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
