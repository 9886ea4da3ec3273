//! Ledger Domain - Running Balances and Bill Reconstruction
//!
//! This crate tracks what each customer of a trading business owes. Two
//! kinds of ledger events move a customer's running balance:
//!
//! - **Sales**: goods delivered, increasing the balance by a derived amount
//! - **Cash**: payments received, decreasing the balance
//!
//! Daily bills and range statements are reconstructed on demand from the
//! stored balance and the dated events.
//!
//! # Components
//!
//! - [`amount`]: the sales amount formula
//! - [`mutation::BalanceMutationEngine`]: records events and applies balance deltas
//! - [`bills::BillEngine`]: reconstructs opening balances and statements
//! - [`lifecycle::CustomerLifecycle`]: opens, renames and closes accounts
//! - [`ports::LedgerStore`]: the storage port, with an in-memory adapter
//!
//! # Example
//!
//! ```rust
//! use domain_ledger::adapters::InMemoryLedgerStore;
//! use domain_ledger::{LedgerService, NewCustomer, NewSalesEntry};
//! use core_kernel::BusinessCalendar;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let service = LedgerService::new(Arc::new(InMemoryLedgerStore::new()), BusinessCalendar::default());
//!
//! service.customers().create_customer(NewCustomer::new("K K", "9876543210")).await.unwrap();
//! let outcome = service
//!     .mutations()
//!     .record_sales(vec![NewSalesEntry::new("K K", "Onion", dec!(20)).with_bags(10)])
//!     .await
//!     .unwrap();
//!
//! assert_eq!(outcome.balances[0].balance, dec!(10100));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod amount;
pub mod sales;
pub mod cash;
pub mod balance;
pub mod customer;
pub mod error;
pub mod ports;
pub mod adapters;
pub mod mutation;
pub mod bills;
pub mod lifecycle;
pub mod service;

pub use amount::{calculate_amount, AmountError, Quantities, ResolvedQuantities};
pub use sales::{NewSalesEntry, SalesEntry, SalesLine, SalesUpdate};
pub use cash::{CashEntry, CashLine, CashUpdate, NewCashEntry};
pub use balance::{Balance, BalanceDelta};
pub use customer::{CascadeSummary, Customer, CustomerChanges, NewCustomer};
pub use error::{ErrorKind, LedgerError};
pub use ports::{EntryQuery, LedgerStore};
pub use mutation::{BalanceMutationEngine, BatchOutcome, EntryOutcome};
pub use bills::{BillEngine, CustomerBill, DayBillRequest, OwnerBillRow, RangeBill, RangeBillRequest, RangeBillRow};
pub use lifecycle::CustomerLifecycle;
pub use service::LedgerService;
