//! Cash entries
//!
//! A cash entry records a payment received from a customer. Its amount is
//! always applied as a reduction of the owed balance, whatever its sign.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::CashEntryId;
use crate::error::LedgerError;
use crate::sales::non_empty;

/// Cash type recorded when none is given
pub const DEFAULT_CASH_TYPE: &str = "cash";

/// A persisted cash entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashEntry {
    #[serde(rename = "_id")]
    pub id: CashEntryId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "cashType")]
    pub cash_type: String,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
    #[serde(rename = "Date")]
    pub date: DateTime<Utc>,
}

impl CashEntry {
    /// The zero-amount entry written when a customer account is opened
    pub fn opening_placeholder(name: impl Into<String>, opened_at: DateTime<Utc>) -> Self {
        Self {
            id: CashEntryId::new(),
            name: name.into(),
            cash_type: DEFAULT_CASH_TYPE.to_string(),
            amount: Decimal::ZERO,
            date: opened_at,
        }
    }

    /// Builds the replacement for this entry from an update request
    pub fn updated_with(&self, update: &CashUpdate) -> Result<CashEntry, LedgerError> {
        let amount = update.amount.ok_or(LedgerError::MissingRequestField("Amount"))?;

        Ok(CashEntry {
            id: self.id,
            name: self.name.clone(),
            cash_type: cash_type_or_default(update.cash_type.as_deref()),
            amount,
            date: update.date.unwrap_or(self.date),
        })
    }
}

/// A cash entry as submitted in a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCashEntry {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "cashType")]
    pub cash_type: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: Option<Decimal>,
    #[serde(rename = "Date")]
    pub date: Option<DateTime<Utc>>,
}

impl NewCashEntry {
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: Some(name.into()),
            amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn with_cash_type(mut self, cash_type: impl Into<String>) -> Self {
        self.cash_type = Some(cash_type.into());
        self
    }

    pub fn dated(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Returns the customer name if one was supplied
    pub fn customer(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    pub(crate) fn into_entry(self, index: usize, now: DateTime<Utc>) -> Result<CashEntry, LedgerError> {
        let name = non_empty(self.name.as_deref())
            .ok_or(LedgerError::MissingField { index, field: "Name" })?
            .to_string();
        let amount = self.amount.ok_or(LedgerError::MissingField { index, field: "Amount" })?;

        Ok(CashEntry {
            id: CashEntryId::new(),
            name,
            cash_type: cash_type_or_default(self.cash_type.as_deref()),
            amount,
            date: self.date.unwrap_or(now),
        })
    }
}

/// Replacement values for an existing cash entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashUpdate {
    #[serde(rename = "cashType")]
    pub cash_type: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: Option<Decimal>,
    #[serde(rename = "Date")]
    pub date: Option<DateTime<Utc>>,
}

impl CashUpdate {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn with_cash_type(mut self, cash_type: impl Into<String>) -> Self {
        self.cash_type = Some(cash_type.into());
        self
    }

    pub fn dated(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// A cash line in a bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashLine {
    #[serde(rename = "_id")]
    pub id: CashEntryId,
    #[serde(rename = "cashType")]
    pub cash_type: String,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
}

impl From<&CashEntry> for CashLine {
    fn from(entry: &CashEntry) -> Self {
        Self {
            id: entry.id,
            cash_type: entry.cash_type.clone(),
            amount: entry.amount,
        }
    }
}

fn cash_type_or_default(cash_type: Option<&str>) -> String {
    non_empty(cash_type).unwrap_or(DEFAULT_CASH_TYPE).to_string()
}
