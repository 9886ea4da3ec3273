//! Bill reconstruction
//!
//! Bills are never stored. Each report starts from the stored running
//! balance and walks backwards through later activity to find the opening
//! balance ("brought forward", BF) of the requested day:
//!
//! ```text
//! BF(c, D) = Stored(c) − SalesSum(c, [D−1, ∞)) + CashSum(c, [D−2, ∞))
//! ```
//!
//! Cash settles the previous day's sales: a payment dated N is credited to
//! day N−1. A day's closing balance is therefore
//! `BF + sales dated D − cash dated D+1`.
//!
//! Zero-amount cash entries, such as the placeholder written when an
//! account is opened, never count as activity.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, warn};

use core_kernel::{BusinessCalendar, DateRange, DateWindow};

use crate::amount::AmountError;
use crate::cash::{CashEntry, CashLine};
use crate::error::LedgerError;
use crate::ports::{EntryQuery, LedgerStore};
use crate::sales::{non_empty, SalesEntry, SalesLine};

/// Request for a single-day bill
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBillRequest {
    pub date: Option<String>,
}

impl DayBillRequest {
    pub fn on(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
        }
    }
}

/// Request for a customer statement over a range of days
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBillRequest {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl RangeBillRequest {
    pub fn new(name: impl Into<String>, start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
        }
    }
}

/// One customer's bill for a single day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerBill {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Name")]
    pub name: String,
    /// Sales dated on the day
    #[serde(rename = "Items")]
    pub items: Vec<SalesLine>,
    #[serde(rename = "TotalSales")]
    pub total_sales: Decimal,
    /// Opening balance
    #[serde(rename = "BF")]
    pub brought_forward: Decimal,
    /// Cash credited to the day
    #[serde(rename = "cash")]
    pub cash: Vec<CashLine>,
    #[serde(rename = "TotalCash")]
    pub total_cash: Decimal,
    /// Closing balance
    #[serde(rename = "Balance")]
    pub balance: Decimal,
}

/// One row of the owner's daily summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OwnerBillRow {
    pub date: NaiveDate,
    pub name: String,
    #[serde(rename = "BF")]
    pub brought_forward: Decimal,
    pub sales: Decimal,
    pub cash: Decimal,
    pub total: Decimal,
}

impl From<&CustomerBill> for OwnerBillRow {
    fn from(bill: &CustomerBill) -> Self {
        Self {
            date: bill.date,
            name: bill.name.clone(),
            brought_forward: bill.brought_forward,
            sales: bill.total_sales,
            cash: bill.total_cash,
            total: bill.balance,
        }
    }
}

/// One active day of a range statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBillRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Sales", skip_serializing_if = "Vec::is_empty", default)]
    pub sales: Vec<SalesLine>,
    #[serde(rename = "TotalSales")]
    pub total_sales: Decimal,
    #[serde(rename = "BF")]
    pub brought_forward: Decimal,
    #[serde(rename = "Cash", skip_serializing_if = "Vec::is_empty", default)]
    pub cash: Vec<CashLine>,
    #[serde(rename = "TotalCash")]
    pub total_cash: Decimal,
    #[serde(rename = "Balance")]
    pub balance: Decimal,
}

/// A customer statement over a range of days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBill {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
    /// Balance brought forward into the first day
    #[serde(rename = "BF")]
    pub brought_forward: Decimal,
    /// Only days with activity; the running balance carries over the rest
    pub rows: Vec<RangeBillRow>,
    /// Balance at the end of the last day
    #[serde(rename = "Balance")]
    pub closing_balance: Decimal,
}

/// Reconstructs bills from ledger entries and stored balances
pub struct BillEngine {
    store: Arc<dyn LedgerStore>,
    calendar: BusinessCalendar,
}

impl BillEngine {
    pub fn new(store: Arc<dyn LedgerStore>, calendar: BusinessCalendar) -> Self {
        Self { store, calendar }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Bills of every customer active on the requested day
    ///
    /// # Errors
    ///
    /// - `DateRequired` / `MalformedDate` for a bad request
    /// - `Inconsistency` if an active customer has no balance record
    pub async fn customer_bills(&self, request: &DayBillRequest) -> Result<Vec<CustomerBill>, LedgerError> {
        let date = self.required_date(request.date.as_deref(), "date")?;
        self.bills_on(date, None).await
    }

    /// The owner's summary of every customer active on the requested day
    pub async fn owner_bill(&self, request: &DayBillRequest) -> Result<Vec<OwnerBillRow>, LedgerError> {
        let date = self.required_date(request.date.as_deref(), "date")?;
        let bills = self.bills_on(date, None).await?;
        Ok(bills.iter().map(OwnerBillRow::from).collect())
    }

    /// A single customer's bill for the requested day
    ///
    /// A customer without activity on the day gets a bill with no lines
    /// whose closing balance equals its opening balance.
    pub async fn customer_bill(&self, name: &str, request: &DayBillRequest) -> Result<CustomerBill, LedgerError> {
        let date = self.required_date(request.date.as_deref(), "date")?;
        self.require_account(name).await?;

        let mut bills = self.bills_on(date, Some(name)).await?;
        if let Some(bill) = bills.pop() {
            return Ok(bill);
        }

        let opening = self.opening_balance(name, date).await?;
        Ok(CustomerBill {
            date,
            name: name.to_string(),
            items: Vec::new(),
            total_sales: Decimal::ZERO,
            brought_forward: opening,
            cash: Vec::new(),
            total_cash: Decimal::ZERO,
            balance: opening,
        })
    }

    /// A customer statement over an inclusive range of days
    ///
    /// # Errors
    ///
    /// - `MissingRequestField` if the name is missing
    /// - `DateRequired` / `MalformedDate` / `InvalidRange` for bad dates
    /// - `NoAccount` if the customer has no balance record
    pub async fn customer_bill_range(&self, request: &RangeBillRequest) -> Result<RangeBill, LedgerError> {
        let name = non_empty(request.name.as_deref())
            .ok_or(LedgerError::MissingRequestField("Name"))?
            .to_string();
        let start = self.required_date(request.start_date.as_deref(), "startDate")?;
        let end = self.required_date(request.end_date.as_deref(), "endDate")?;
        let range = DateRange::new(start, end)?;

        self.require_account(&name).await?;
        let opening = self.opening_balance(&name, start).await?;

        let sales = self
            .store
            .find_sales(&EntryQuery::for_name(name.as_str(), self.calendar.days(range)?))
            .await?;
        let credited_range = DateRange::new(self.calendar.shift(start, 1)?, self.calendar.shift(end, 1)?)?;
        let cash = self
            .store
            .find_cash(&EntryQuery::for_name(name.as_str(), self.calendar.days(credited_range)?))
            .await?;

        let mut days: BTreeMap<NaiveDate, (Vec<SalesLine>, Vec<CashLine>)> = BTreeMap::new();
        for entry in &sales {
            let day = self.calendar.date_of(entry.date);
            days.entry(day).or_default().0.push(SalesLine::from(entry));
        }
        for entry in cash.iter().filter(|e| !e.amount.is_zero()) {
            let day = self.calendar.shift(self.calendar.date_of(entry.date), -1)?;
            days.entry(day).or_default().1.push(CashLine::from(entry));
        }

        let mut running = opening;
        let mut rows = Vec::with_capacity(days.len());
        for (date, (sales, cash)) in days {
            let total_sales = sum(sales.iter().map(|l| l.amount), &name)?;
            let total_cash = sum(cash.iter().map(|l| l.amount), &name)?;
            let brought_forward = running;
            running = closing(brought_forward, total_sales, total_cash, &name)?;

            rows.push(RangeBillRow {
                name: name.clone(),
                date,
                sales,
                total_sales,
                brought_forward,
                cash,
                total_cash,
                balance: running,
            });
        }

        debug!(customer = %name, %start, %end, rows = rows.len(), "Reconstructed range bill");
        Ok(RangeBill {
            name,
            start_date: start,
            end_date: end,
            brought_forward: opening,
            rows,
            closing_balance: running,
        })
    }

    /// Opening balance of a customer for a day
    pub async fn opening_balance(&self, name: &str, date: NaiveDate) -> Result<Decimal, LedgerError> {
        let stored = self.require_account(name).await?;
        let names = vec![name.to_string()];
        let (sales_since, cash_since) = self.activity_since(&names, date).await?;

        brought_forward(
            stored,
            sales_since.get(name).copied().unwrap_or_default(),
            cash_since.get(name).copied().unwrap_or_default(),
            name,
        )
    }

    /// Bills of the customers active on a day, optionally limited to one
    ///
    /// Customers are ordered by first appearance: sales on the day first,
    /// then non-zero cash dated on the day or the day after.
    pub async fn bills_on(&self, date: NaiveDate, only: Option<&str>) -> Result<Vec<CustomerBill>, LedgerError> {
        let day = self.calendar.day(date)?;
        let next = self.calendar.shift(date, 1)?;
        let credited_day = self.calendar.day(next)?;
        let cash_window = self.calendar.days(DateRange::new(date, next)?)?;

        let scoped = |window: DateWindow| match only {
            Some(name) => EntryQuery::for_name(name, window),
            None => EntryQuery::all(window),
        };

        let sales = self.store.find_sales(&scoped(day)).await?;
        let cash: Vec<CashEntry> = self
            .store
            .find_cash(&scoped(cash_window))
            .await?
            .into_iter()
            .filter(|e| !e.amount.is_zero())
            .collect();

        let names = active_names(&sales, &cash);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let stored: HashMap<String, Decimal> = self
            .store
            .get_balances(&names)
            .await?
            .into_iter()
            .map(|b| (b.name, b.balance))
            .collect();
        let (sales_since, cash_since) = self.activity_since(&names, date).await?;

        let mut bills = Vec::with_capacity(names.len());
        for name in names {
            let Some(&balance) = stored.get(&name) else {
                error!(customer = %name, %date, "Ledger entries reference a customer without balance record");
                return Err(LedgerError::Inconsistency(format!(
                    "Customer '{}' has entries on {} but no balance record",
                    name, date
                )));
            };

            let items: Vec<SalesLine> = sales
                .iter()
                .filter(|e| e.name == name)
                .map(SalesLine::from)
                .collect();
            let credited: Vec<CashLine> = cash
                .iter()
                .filter(|e| e.name == name && credited_day.contains(e.date))
                .map(CashLine::from)
                .collect();

            let opening = brought_forward(
                balance,
                sales_since.get(&name).copied().unwrap_or_default(),
                cash_since.get(&name).copied().unwrap_or_default(),
                &name,
            )?;
            let total_sales = sum(items.iter().map(|l| l.amount), &name)?;
            let total_cash = sum(credited.iter().map(|l| l.amount), &name)?;

            bills.push(CustomerBill {
                date,
                balance: closing(opening, total_sales, total_cash, &name)?,
                name,
                items,
                total_sales,
                brought_forward: opening,
                cash: credited,
                total_cash,
            });
        }

        debug!(%date, customers = bills.len(), "Reconstructed day bills");
        Ok(bills)
    }

    /// Sales since D−1 and cash since D−2, per customer
    async fn activity_since(
        &self,
        names: &[String],
        date: NaiveDate,
    ) -> Result<(HashMap<String, Decimal>, HashMap<String, Decimal>), LedgerError> {
        let sales_from = self.calendar.from_day(self.calendar.shift(date, -1)?)?;
        let cash_from = self.calendar.from_day(self.calendar.shift(date, -2)?)?;

        let sales = self
            .store
            .sum_sales(&EntryQuery::for_names(names.to_vec(), sales_from))
            .await?;
        let cash = self
            .store
            .sum_cash(&EntryQuery::for_names(names.to_vec(), cash_from))
            .await?;
        Ok((sales, cash))
    }

    async fn require_account(&self, name: &str) -> Result<Decimal, LedgerError> {
        match self.store.get_balance(name).await? {
            Some(balance) => Ok(balance.balance),
            None => {
                warn!(customer = %name, "Bill requested for customer without account");
                Err(LedgerError::NoAccount(name.to_string()))
            }
        }
    }

    fn required_date(&self, input: Option<&str>, field: &'static str) -> Result<NaiveDate, LedgerError> {
        let input = non_empty(input).ok_or(LedgerError::DateRequired(field))?;
        Ok(self.calendar.parse_date(input)?)
    }
}

/// Customers with sales or non-zero cash, in first-seen order
fn active_names(sales: &[SalesEntry], cash: &[CashEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    sales
        .iter()
        .map(|e| e.name.as_str())
        .chain(cash.iter().map(|e| e.name.as_str()))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

fn overflow(name: &str) -> LedgerError {
    LedgerError::Amount(AmountError::DeltaOverflow(name.to_string()))
}

fn sum(mut amounts: impl Iterator<Item = Decimal>, name: &str) -> Result<Decimal, LedgerError> {
    amounts.try_fold(Decimal::ZERO, |total, amount| {
        total.checked_add(amount).ok_or_else(|| overflow(name))
    })
}

fn brought_forward(stored: Decimal, sales_since: Decimal, cash_since: Decimal, name: &str) -> Result<Decimal, LedgerError> {
    stored
        .checked_sub(sales_since)
        .and_then(|v| v.checked_add(cash_since))
        .ok_or_else(|| overflow(name))
}

fn closing(opening: Decimal, sales: Decimal, cash: Decimal, name: &str) -> Result<Decimal, LedgerError> {
    opening
        .checked_add(sales)
        .and_then(|v| v.checked_sub(cash))
        .ok_or_else(|| overflow(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::CashEntryId;

    fn cash(name: &str, amount: i64) -> CashEntry {
        CashEntry {
            id: CashEntryId::new(),
            name: name.to_string(),
            cash_type: "cash".to_string(),
            amount: Decimal::from(amount),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_active_names_are_unique_and_ordered() {
        let names = active_names(&[], &[cash("B", 5), cash("A", 3), cash("B", 1)]);
        assert_eq!(names, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_brought_forward_reverses_later_activity() {
        let bf = brought_forward(Decimal::from(220), Decimal::from(300), Decimal::from(80), "A").unwrap();
        assert_eq!(bf, Decimal::ZERO);
    }

    #[test]
    fn test_range_request_uses_original_field_names() {
        let json = r#"{"Name":"A","startDate":"2024-01-01","endDate":"2024-01-05"}"#;
        let request: RangeBillRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request, RangeBillRequest::new("A", "2024-01-01", "2024-01-05"));
    }
}
