//! Sales entries
//!
//! A sales entry records goods delivered to a customer and increases what
//! the customer owes by its derived `Amount`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::SalesEntryId;
use crate::amount::{calculate_amount, Quantities, ResolvedQuantities};
use crate::error::LedgerError;

/// A persisted sales entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesEntry {
    #[serde(rename = "_id")]
    pub id: SalesEntryId,
    /// Customer name
    pub name: String,
    /// Item sold
    pub item: String,
    pub bags: i64,
    pub weight: Decimal,
    pub cooly: Decimal,
    pub price: Decimal,
    /// Derived amount (cached)
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

impl SalesEntry {
    /// Returns the quantity fields of this entry
    pub fn quantities(&self) -> ResolvedQuantities {
        ResolvedQuantities {
            bags: self.bags,
            weight: self.weight,
            cooly: self.cooly,
        }
    }

    /// Builds the replacement for this entry from an update request
    ///
    /// The customer and id are kept; quantities are re-resolved and the
    /// amount is derived again. A missing date keeps the stored date.
    pub fn updated_with(&self, update: &SalesUpdate) -> Result<SalesEntry, LedgerError> {
        let item = non_empty(update.item.as_deref()).ok_or(LedgerError::MissingRequestField("Item"))?;
        let price = update
            .price
            .filter(|p| !p.is_zero())
            .ok_or(LedgerError::MissingRequestField("Price"))?;
        let quantities = Quantities::new(update.bags, update.weight, update.cooly).resolve();
        let amount = calculate_amount(price, &quantities)?;

        Ok(SalesEntry {
            id: self.id,
            name: self.name.clone(),
            item: item.to_string(),
            bags: quantities.bags,
            weight: quantities.weight,
            cooly: quantities.cooly,
            price,
            amount,
            date: update.date.unwrap_or(self.date),
        })
    }
}

/// A sales entry as submitted in a batch
///
/// All fields are optional so that missing fields can be reported with
/// the offending batch index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewSalesEntry {
    pub name: Option<String>,
    pub item: Option<String>,
    pub bags: Option<i64>,
    pub weight: Option<Decimal>,
    pub cooly: Option<Decimal>,
    pub price: Option<Decimal>,
    pub date: Option<DateTime<Utc>>,
}

impl NewSalesEntry {
    /// Creates a request with the required fields set
    pub fn new(name: impl Into<String>, item: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: Some(name.into()),
            item: Some(item.into()),
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn with_bags(mut self, bags: i64) -> Self {
        self.bags = Some(bags);
        self
    }

    pub fn with_weight(mut self, weight: Decimal) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_cooly(mut self, cooly: Decimal) -> Self {
        self.cooly = Some(cooly);
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

    /// Checks required fields and derives the persisted entry
    ///
    /// Empty strings and a zero price count as missing.
    pub(crate) fn into_entry(self, index: usize, now: DateTime<Utc>) -> Result<SalesEntry, LedgerError> {
        let name = non_empty(self.name.as_deref())
            .ok_or(LedgerError::MissingField { index, field: "Name" })?
            .to_string();
        let item = non_empty(self.item.as_deref())
            .ok_or(LedgerError::MissingField { index, field: "Item" })?
            .to_string();
        let price = self
            .price
            .filter(|p| !p.is_zero())
            .ok_or(LedgerError::MissingField { index, field: "Price" })?;

        let quantities = Quantities::new(self.bags, self.weight, self.cooly).resolve();
        let amount = calculate_amount(price, &quantities)
            .map_err(|source| LedgerError::AmountCalculation { index, source })?;

        Ok(SalesEntry {
            id: SalesEntryId::new(),
            name,
            item,
            bags: quantities.bags,
            weight: quantities.weight,
            cooly: quantities.cooly,
            price,
            amount,
            date: self.date.unwrap_or(now),
        })
    }
}

/// Replacement values for an existing sales entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesUpdate {
    pub item: Option<String>,
    pub bags: Option<i64>,
    pub weight: Option<Decimal>,
    pub cooly: Option<Decimal>,
    pub price: Option<Decimal>,
    pub date: Option<DateTime<Utc>>,
}

impl SalesUpdate {
    pub fn new(item: impl Into<String>, price: Decimal) -> Self {
        Self {
            item: Some(item.into()),
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn with_bags(mut self, bags: i64) -> Self {
        self.bags = Some(bags);
        self
    }

    pub fn with_weight(mut self, weight: Decimal) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_cooly(mut self, cooly: Decimal) -> Self {
        self.cooly = Some(cooly);
        self
    }

    pub fn dated(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// An itemized sales line in a bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesLine {
    #[serde(rename = "_id")]
    pub id: SalesEntryId,
    pub item: String,
    pub bags: i64,
    pub weight: Decimal,
    pub cooly: Decimal,
    pub price: Decimal,
    pub amount: Decimal,
}

impl From<&SalesEntry> for SalesLine {
    fn from(entry: &SalesEntry) -> Self {
        Self {
            id: entry.id,
            item: entry.item.clone(),
            bags: entry.bags,
            weight: entry.weight,
            cooly: entry.cooly,
            price: entry.price,
            amount: entry.amount,
        }
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
