//! Customer lifecycle
//!
//! Every write to a customer's `Name` goes through this module so that the
//! customer record, ledger entries and balance never disagree on it.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use core_kernel::{CustomerId, PortError};

use crate::balance::Balance;
use crate::cash::CashEntry;
use crate::customer::{CascadeSummary, Customer, CustomerChanges, NewCustomer};
use crate::error::LedgerError;
use crate::ports::LedgerStore;

/// Opens, renames and closes customer accounts
pub struct CustomerLifecycle {
    store: Arc<dyn LedgerStore>,
}

impl CustomerLifecycle {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Opens an account: customer record, zero cash placeholder and zero balance
    ///
    /// # Errors
    ///
    /// - `MissingRequestField` if `Name` or `Number` is missing
    /// - `DuplicateCustomer` if the name is taken
    pub async fn create_customer(&self, request: NewCustomer) -> Result<Customer, LedgerError> {
        let customer = request.into_customer()?;

        if self.store.find_customer_by_name(&customer.name).await?.is_some() {
            warn!(customer = %customer.name, "Rejected duplicate customer");
            return Err(LedgerError::DuplicateCustomer(customer.name));
        }

        let placeholder = CashEntry::opening_placeholder(&customer.name, Utc::now());
        match self.store.create_customer_account(&customer, &placeholder).await {
            Ok(()) => {
                info!(customer = %customer.name, id = %customer.id, "Opened customer account");
                Ok(customer)
            }
            // lost a race with a concurrent create of the same name
            Err(PortError::Conflict(_)) => Err(LedgerError::DuplicateCustomer(customer.name)),
            Err(other) => Err(other.into()),
        }
    }

    /// Updates a customer; a new name is carried to every ledger record
    ///
    /// # Errors
    ///
    /// - `CustomerIdNotFound` if no customer has this id
    /// - `DuplicateCustomer` if another customer already has the new name
    pub async fn update_customer(&self, id: CustomerId, changes: CustomerChanges) -> Result<Customer, LedgerError> {
        let current = self
            .store
            .find_customer(id)
            .await?
            .ok_or(LedgerError::CustomerIdNotFound(id))?;
        let updated = changes.apply_to(&current);

        if updated == current {
            return Ok(current);
        }

        match self.store.update_customer(&current.name, &updated).await {
            Ok(()) => {
                if updated.name != current.name {
                    info!(id = %id, from = %current.name, to = %updated.name, "Renamed customer");
                } else {
                    info!(id = %id, customer = %updated.name, "Updated customer");
                }
                Ok(updated)
            }
            Err(PortError::Conflict(_)) => {
                warn!(id = %id, name = %updated.name, "Rejected rename to an existing customer name");
                Err(LedgerError::DuplicateCustomer(updated.name))
            }
            Err(PortError::NotFound { .. }) => Err(LedgerError::CustomerIdNotFound(id)),
            Err(other) => Err(other.into()),
        }
    }

    /// Closes an account and removes every record bearing its name
    pub async fn delete_customer(&self, name: &str) -> Result<CascadeSummary, LedgerError> {
        match self.store.delete_customer(name).await {
            Ok(summary) => {
                info!(
                    customer = %name,
                    sales = summary.sales_entries,
                    cash = summary.cash_entries,
                    "Deleted customer"
                );
                Ok(summary)
            }
            Err(PortError::NotFound { .. }) => Err(LedgerError::UnknownCustomer(name.to_string())),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, LedgerError> {
        Ok(self.store.list_customers().await?)
    }

    /// Every stored balance
    pub async fn balance_report(&self) -> Result<Vec<Balance>, LedgerError> {
        Ok(self.store.list_balances().await?)
    }

    /// The stored balance of one customer
    pub async fn balance_of(&self, name: &str) -> Result<Balance, LedgerError> {
        self.store
            .get_balance(name)
            .await?
            .ok_or_else(|| LedgerError::NoAccount(name.to_string()))
    }
}
