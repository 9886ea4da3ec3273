//! Customer identity
//!
//! A customer's `Name` is the key embedded in every sales entry, cash entry
//! and balance record. Renaming or deleting a customer therefore cascades
//! across all ledger collections.

use serde::{Deserialize, Serialize};

use core_kernel::CustomerId;
use crate::error::LedgerError;
use crate::sales::non_empty;

/// A customer identity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: CustomerId,
    pub name: String,
    /// Contact number
    pub number: String,
}

/// Request to open a customer account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewCustomer {
    pub name: Option<String>,
    pub number: Option<String>,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            number: Some(number.into()),
        }
    }

    pub(crate) fn into_customer(self) -> Result<Customer, LedgerError> {
        let name = non_empty(self.name.as_deref())
            .ok_or(LedgerError::MissingRequestField("Name"))?
            .trim()
            .to_string();
        let number = non_empty(self.number.as_deref())
            .ok_or(LedgerError::MissingRequestField("Number"))?
            .trim()
            .to_string();

        Ok(Customer {
            id: CustomerId::new(),
            name,
            number,
        })
    }
}

/// Changes to a customer identity
///
/// Absent or empty fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub number: Option<String>,
}

impl CustomerChanges {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            number: None,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Applies the changes to a copy of the current record
    pub fn apply_to(&self, current: &Customer) -> Customer {
        Customer {
            id: current.id,
            name: non_empty(self.name.as_deref())
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| current.name.clone()),
            number: non_empty(self.number.as_deref())
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| current.number.clone()),
        }
    }
}

/// Records removed by a customer delete cascade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeSummary {
    pub customers: u64,
    pub sales_entries: u64,
    pub cash_entries: u64,
    pub balances: u64,
}
