//! Test Data Builders
//!
//! Builders for seeded ledgers and persisted entries. Tests name only the
//! customers and activity they care about; everything else defaults.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use core_kernel::{BusinessCalendar, CashEntryId, SalesEntryId};
use domain_ledger::adapters::{InMemoryLedgerStore, LedgerSnapshot};
use domain_ledger::{
    calculate_amount, CashEntry, LedgerService, LedgerStore, NewCashEntry, NewSalesEntry, Quantities,
    SalesEntry,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{CustomerFixtures, TemporalFixtures};

/// An in-memory ledger service together with its store
pub struct TestLedger {
    pub service: LedgerService,
    pub store: InMemoryLedgerStore,
}

impl TestLedger {
    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.store.snapshot().await
    }
}

/// Builder for a ledger seeded through the public operations
///
/// Customers are opened first, then sales are recorded, then cash, so the
/// stored balances are exactly what the mutation engine produces.
pub struct TestLedgerBuilder {
    customers: Vec<String>,
    sales: Vec<NewSalesEntry>,
    cash: Vec<NewCashEntry>,
    calendar: BusinessCalendar,
}

impl Default for TestLedgerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedgerBuilder {
    pub fn new() -> Self {
        Self {
            customers: Vec::new(),
            sales: Vec::new(),
            cash: Vec::new(),
            calendar: BusinessCalendar::default(),
        }
    }

    /// Opens an account for `name`
    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customers.push(name.into());
        self
    }

    pub fn with_customers(mut self, names: &[&str]) -> Self {
        self.customers.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_sales(mut self, entries: impl IntoIterator<Item = NewSalesEntry>) -> Self {
        self.sales.extend(entries);
        self
    }

    pub fn with_cash(mut self, entries: impl IntoIterator<Item = NewCashEntry>) -> Self {
        self.cash.extend(entries);
        self
    }

    pub fn with_calendar(mut self, calendar: BusinessCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Builds the ledger over a fresh in-memory store
    ///
    /// # Panics
    ///
    /// Panics if any seeding operation is rejected
    pub async fn build(self) -> TestLedger {
        let store = InMemoryLedgerStore::new();
        let service = self.seed(Arc::new(store.clone())).await;
        TestLedger { service, store }
    }

    /// Seeds an arbitrary store and returns the service over it
    ///
    /// # Panics
    ///
    /// Panics if any seeding operation is rejected
    pub async fn seed(self, store: Arc<dyn LedgerStore>) -> LedgerService {
        let service = LedgerService::new(store, self.calendar);

        for name in &self.customers {
            service
                .customers()
                .create_customer(CustomerFixtures::new_customer(name))
                .await
                .expect("Failed to open test customer");
        }
        if !self.sales.is_empty() {
            service
                .mutations()
                .record_sales(self.sales)
                .await
                .expect("Failed to record test sales");
        }
        if !self.cash.is_empty() {
            service
                .mutations()
                .record_cash(self.cash)
                .await
                .expect("Failed to record test cash");
        }
        service
    }
}

/// Builder for a persisted sales entry, bypassing the mutation engine
///
/// Useful for seeding snapshots directly, including inconsistent ones.
pub struct SalesEntryBuilder {
    name: String,
    item: String,
    bags: Option<i64>,
    weight: Option<Decimal>,
    cooly: Option<Decimal>,
    price: Decimal,
    date: DateTime<Utc>,
}

impl SalesEntryBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item: "Onion".to_string(),
            bags: None,
            weight: None,
            cooly: None,
            price: dec!(20),
            date: TemporalFixtures::jan(1),
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    pub fn with_bags(mut self, bags: i64) -> Self {
        self.bags = Some(bags);
        self
    }

    pub fn with_weight(mut self, weight: Decimal) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn dated(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Builds the entry with its amount derived from the quantities
    pub fn build(self) -> SalesEntry {
        let quantities = Quantities::new(self.bags, self.weight, self.cooly).resolve();
        let amount = calculate_amount(self.price, &quantities).expect("Test amount overflowed");
        SalesEntry {
            id: SalesEntryId::new(),
            name: self.name,
            item: self.item,
            bags: quantities.bags,
            weight: quantities.weight,
            cooly: quantities.cooly,
            price: self.price,
            amount,
            date: self.date,
        }
    }
}

/// Builds a persisted cash entry, bypassing the mutation engine
pub fn cash_entry(name: &str, amount: Decimal, date: DateTime<Utc>) -> CashEntry {
    CashEntry {
        id: CashEntryId::new(),
        name: name.to_string(),
        cash_type: "cash".to_string(),
        amount,
        date,
    }
}
