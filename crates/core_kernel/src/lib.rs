//! Core Kernel - Foundational types shared by the ledger crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Strongly-typed identifiers for ledger records
//! - Business calendar handling (day windows, date parsing, timezones)
//! - Port error and health-check abstractions for storage adapters

pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use temporal::{BusinessCalendar, DateRange, DateWindow, TemporalError, Timezone};
pub use identifiers::{CashEntryId, CustomerId, SalesEntryId};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
pub use error::CoreError;
