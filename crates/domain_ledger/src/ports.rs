//! Ledger Store Port
//!
//! The `LedgerStore` trait is everything the ledger engines need from
//! persistence. Two adapters implement it:
//!
//! - **In-memory store**: `adapters::memory::InMemoryLedgerStore`
//! - **PostgreSQL store**: `infra_db::PostgresLedgerStore`
//!
//! # Atomicity
//!
//! Balances are moved with `apply_balance_delta`, which must be atomic per
//! customer: two concurrent deltas on the same name must both be reflected.
//! Customer account creation, rename and delete touch every collection and
//! must be all-or-nothing.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_ledger::ports::LedgerStore;
//! use std::sync::Arc;
//!
//! pub struct Reports {
//!     store: Arc<dyn LedgerStore>,
//! }
//!
//! impl Reports {
//!     pub async fn balance(&self, name: &str) -> Result<Option<Balance>, PortError> {
//!         self.store.get_balance(name).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

use core_kernel::{
    CashEntryId, CustomerId, DateWindow, DomainPort, HealthCheckable, PortError, SalesEntryId,
};

use crate::balance::Balance;
use crate::cash::CashEntry;
use crate::customer::{CascadeSummary, Customer};
use crate::sales::SalesEntry;

/// Selects ledger entries by customer and date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    /// Restrict to these customers, None means every customer
    pub names: Option<Vec<String>>,
    /// Entry dates to include
    pub window: DateWindow,
}

impl EntryQuery {
    /// Entries of every customer within the window
    pub fn all(window: DateWindow) -> Self {
        Self { names: None, window }
    }

    /// Entries of one customer within the window
    pub fn for_name(name: impl Into<String>, window: DateWindow) -> Self {
        Self {
            names: Some(vec![name.into()]),
            window,
        }
    }

    /// Entries of the given customers within the window
    pub fn for_names(names: Vec<String>, window: DateWindow) -> Self {
        Self {
            names: Some(names),
            window,
        }
    }

    /// Returns true if an entry with this name and date is selected
    pub fn matches(&self, name: &str, date: DateTime<Utc>) -> bool {
        let name_matches = self
            .names
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == name));
        name_matches && self.window.contains(date)
    }
}

/// Storage port for customers, ledger entries and running balances
///
/// Entry lookups return entries ordered by date, ties broken by insertion
/// order.
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable {
    // ========================================================================
    // Customers
    // ========================================================================

    /// Opens a customer account
    ///
    /// Writes the customer record, the opening cash placeholder and a zero
    /// balance in one atomic step.
    ///
    /// # Returns
    ///
    /// `PortError::Conflict` if a customer with the same name exists
    async fn create_customer_account(
        &self,
        customer: &Customer,
        opening_cash: &CashEntry,
    ) -> Result<(), PortError>;

    /// Retrieves a customer by id
    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, PortError>;

    /// Retrieves a customer by name
    async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>, PortError>;

    /// Lists every customer in creation order
    async fn list_customers(&self) -> Result<Vec<Customer>, PortError>;

    /// Replaces a customer record, renaming every ledger record on a name change
    ///
    /// # Arguments
    ///
    /// * `previous_name` - The name currently stored for `customer.id`
    /// * `customer` - The new customer record
    ///
    /// # Returns
    ///
    /// `PortError::NotFound` if the customer does not exist, or
    /// `PortError::Conflict` if another customer holds the new name
    async fn update_customer(&self, previous_name: &str, customer: &Customer) -> Result<(), PortError>;

    /// Removes a customer and every ledger record bearing its name
    ///
    /// # Returns
    ///
    /// Counts of removed records, or `PortError::NotFound`
    async fn delete_customer(&self, name: &str) -> Result<CascadeSummary, PortError>;

    // ========================================================================
    // Balances
    // ========================================================================

    /// Retrieves the balance record of a customer
    async fn get_balance(&self, name: &str) -> Result<Option<Balance>, PortError>;

    /// Retrieves the balance records that exist for the given names
    async fn get_balances(&self, names: &[String]) -> Result<Vec<Balance>, PortError>;

    /// Lists every balance record
    async fn list_balances(&self) -> Result<Vec<Balance>, PortError>;

    /// Atomically adds a signed delta to a customer's balance
    ///
    /// # Returns
    ///
    /// The balance after the delta, or `PortError::NotFound` if the
    /// customer has no balance record
    async fn apply_balance_delta(&self, name: &str, delta: Decimal) -> Result<Decimal, PortError>;

    // ========================================================================
    // Sales entries
    // ========================================================================

    /// Persists a batch of sales entries
    ///
    /// All or nothing. The account check runs in the same atomic section
    /// as the write, so a concurrent delete or rename cannot strand the
    /// entries.
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` keyed by the first name without a balance
    /// record; nothing is written
    async fn insert_sales(&self, entries: &[SalesEntry]) -> Result<usize, PortError>;

    async fn get_sales(&self, id: SalesEntryId) -> Result<Option<SalesEntry>, PortError>;

    /// Replaces a stored sales entry
    ///
    /// The stored customer name is kept whatever `entry.name` says; only
    /// customer cascades move entries between names.
    ///
    /// # Returns
    ///
    /// The entry as it was before the replacement
    async fn replace_sales(&self, entry: &SalesEntry) -> Result<SalesEntry, PortError>;

    /// Removes a sales entry and returns it
    async fn delete_sales(&self, id: SalesEntryId) -> Result<SalesEntry, PortError>;

    async fn find_sales(&self, query: &EntryQuery) -> Result<Vec<SalesEntry>, PortError>;

    /// Sums sales amounts per customer; customers without entries are absent
    async fn sum_sales(&self, query: &EntryQuery) -> Result<HashMap<String, Decimal>, PortError>;

    // ========================================================================
    // Cash entries
    // ========================================================================

    /// Persists a batch of cash entries
    ///
    /// All or nothing. The account check runs in the same atomic section
    /// as the write, so a concurrent delete or rename cannot strand the
    /// entries.
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` keyed by the first name without a balance
    /// record; nothing is written
    async fn insert_cash(&self, entries: &[CashEntry]) -> Result<usize, PortError>;

    async fn get_cash(&self, id: CashEntryId) -> Result<Option<CashEntry>, PortError>;

    /// Replaces a stored cash entry
    ///
    /// The stored customer name is kept whatever `entry.name` says; only
    /// customer cascades move entries between names.
    ///
    /// # Returns
    ///
    /// The entry as it was before the replacement
    async fn replace_cash(&self, entry: &CashEntry) -> Result<CashEntry, PortError>;

    /// Removes a cash entry and returns it
    async fn delete_cash(&self, id: CashEntryId) -> Result<CashEntry, PortError>;

    async fn find_cash(&self, query: &EntryQuery) -> Result<Vec<CashEntry>, PortError>;

    /// Sums cash amounts per customer; customers without entries are absent
    async fn sum_cash(&self, query: &EntryQuery) -> Result<HashMap<String, Decimal>, PortError>;
}
