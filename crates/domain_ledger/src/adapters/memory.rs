//! In-memory ledger store
//!
//! Keeps every collection behind a single `tokio::sync::RwLock`. Balance
//! deltas and customer cascades run inside one write-lock section, which
//! gives them the same atomicity the PostgreSQL store gets from
//! transactions.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use core_kernel::{
    CashEntryId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable,
    PortError, SalesEntryId,
};

use crate::balance::Balance;
use crate::cash::CashEntry;
use crate::customer::{CascadeSummary, Customer};
use crate::ports::{EntryQuery, LedgerStore};
use crate::sales::SalesEntry;

/// Contents of an in-memory ledger
///
/// Collections keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub customers: Vec<Customer>,
    pub sales: Vec<SalesEntry>,
    pub cash: Vec<CashEntry>,
    pub balances: Vec<Balance>,
}

impl LedgerSnapshot {
    /// Σ sales − Σ cash for a customer, computed from the entries
    pub fn recomputed_balance(&self, name: &str) -> Decimal {
        let sales: Decimal = self
            .sales
            .iter()
            .filter(|e| e.name == name)
            .map(|e| e.amount)
            .sum();
        let cash: Decimal = self
            .cash
            .iter()
            .filter(|e| e.name == name)
            .map(|e| e.amount)
            .sum();
        sales - cash
    }

    /// The stored balance of a customer
    pub fn stored_balance(&self, name: &str) -> Option<Decimal> {
        self.balances
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.balance)
    }

    /// `NotFound` for the first name without a balance record
    fn ensure_accounts<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> Result<(), PortError> {
        match names.find(|name| !self.balances.iter().any(|b| b.name == *name)) {
            Some(missing) => Err(PortError::not_found("Balance", missing)),
            None => Ok(()),
        }
    }

    fn has_customer_named(&self, name: &str) -> bool {
        self.customers.iter().any(|c| c.name == name)
    }
}

/// Ledger store holding all data in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerSnapshot>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given contents
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Returns a copy of the current contents
    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.state.read().await.clone()
    }
}

fn sorted_by_date<T: Clone>(entries: impl Iterator<Item = T>, date: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut selected: Vec<T> = entries.collect();
    // stable: equal dates keep insertion order
    selected.sort_by_key(|e| date(e));
    selected
}

fn sum_by_name<'a>(
    amounts: impl Iterator<Item = (&'a str, Decimal)>,
) -> Result<HashMap<String, Decimal>, PortError> {
    let mut sums: HashMap<String, Decimal> = HashMap::new();
    for (name, amount) in amounts {
        let total = sums.entry(name.to_string()).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(amount)
            .ok_or_else(|| PortError::internal(format!("Sum overflow for customer '{}'", name)))?;
    }
    Ok(sums)
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("in-memory-ledger-store", 0)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_customer_account(
        &self,
        customer: &Customer,
        opening_cash: &CashEntry,
    ) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.has_customer_named(&customer.name) {
            return Err(PortError::conflict(format!(
                "Customer '{}' already exists",
                customer.name
            )));
        }

        state.customers.push(customer.clone());
        state.cash.push(opening_cash.clone());
        // a balance left behind by an earlier partial write is reset
        state.balances.retain(|b| b.name != customer.name);
        state.balances.push(Balance::opening(&customer.name));
        debug!(customer = %customer.name, "Opened customer account");
        Ok(())
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        let state = self.state.read().await;
        Ok(state.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>, PortError> {
        let state = self.state.read().await;
        Ok(state.customers.iter().find(|c| c.name == name).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, PortError> {
        Ok(self.state.read().await.customers.clone())
    }

    async fn update_customer(&self, previous_name: &str, customer: &Customer) -> Result<(), PortError> {
        let mut state = self.state.write().await;

        if state
            .customers
            .iter()
            .any(|c| c.name == customer.name && c.id != customer.id)
        {
            return Err(PortError::conflict(format!(
                "Customer '{}' already exists",
                customer.name
            )));
        }

        let position = state
            .customers
            .iter()
            .position(|c| c.id == customer.id)
            .ok_or_else(|| PortError::not_found("Customer", customer.id))?;
        state.customers[position] = customer.clone();

        if previous_name != customer.name {
            for entry in state.sales.iter_mut().filter(|e| e.name == previous_name) {
                entry.name = customer.name.clone();
            }
            for entry in state.cash.iter_mut().filter(|e| e.name == previous_name) {
                entry.name = customer.name.clone();
            }
            for balance in state.balances.iter_mut().filter(|b| b.name == previous_name) {
                balance.name = customer.name.clone();
            }
            debug!(from = %previous_name, to = %customer.name, "Renamed customer records");
        }
        Ok(())
    }

    async fn delete_customer(&self, name: &str) -> Result<CascadeSummary, PortError> {
        let mut state = self.state.write().await;
        if !state.has_customer_named(name) {
            return Err(PortError::not_found("Customer", name));
        }

        fn remove<T>(items: &mut Vec<T>, keep: impl Fn(&T) -> bool) -> u64 {
            let before = items.len();
            items.retain(keep);
            (before - items.len()) as u64
        }

        let summary = CascadeSummary {
            customers: remove(&mut state.customers, |c| c.name != name),
            sales_entries: remove(&mut state.sales, |e| e.name != name),
            cash_entries: remove(&mut state.cash, |e| e.name != name),
            balances: remove(&mut state.balances, |b| b.name != name),
        };
        debug!(customer = %name, ?summary, "Deleted customer records");
        Ok(summary)
    }

    async fn get_balance(&self, name: &str) -> Result<Option<Balance>, PortError> {
        let state = self.state.read().await;
        Ok(state.balances.iter().find(|b| b.name == name).cloned())
    }

    async fn get_balances(&self, names: &[String]) -> Result<Vec<Balance>, PortError> {
        let state = self.state.read().await;
        Ok(state
            .balances
            .iter()
            .filter(|b| names.contains(&b.name))
            .cloned()
            .collect())
    }

    async fn list_balances(&self) -> Result<Vec<Balance>, PortError> {
        Ok(self.state.read().await.balances.clone())
    }

    async fn apply_balance_delta(&self, name: &str, delta: Decimal) -> Result<Decimal, PortError> {
        let mut state = self.state.write().await;
        let balance = state
            .balances
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| PortError::not_found("Balance", name))?;

        balance.balance = balance
            .balance
            .checked_add(delta)
            .ok_or_else(|| PortError::internal(format!("Balance overflow for customer '{}'", name)))?;
        Ok(balance.balance)
    }

    async fn insert_sales(&self, entries: &[SalesEntry]) -> Result<usize, PortError> {
        let mut state = self.state.write().await;
        state.ensure_accounts(entries.iter().map(|e| e.name.as_str()))?;
        state.sales.extend_from_slice(entries);
        Ok(entries.len())
    }

    async fn get_sales(&self, id: SalesEntryId) -> Result<Option<SalesEntry>, PortError> {
        let state = self.state.read().await;
        Ok(state.sales.iter().find(|e| e.id == id).cloned())
    }

    async fn replace_sales(&self, entry: &SalesEntry) -> Result<SalesEntry, PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .sales
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| PortError::not_found("SalesEntry", entry.id))?;
        let replacement = SalesEntry {
            name: stored.name.clone(),
            ..entry.clone()
        };
        Ok(std::mem::replace(stored, replacement))
    }

    async fn delete_sales(&self, id: SalesEntryId) -> Result<SalesEntry, PortError> {
        let mut state = self.state.write().await;
        let position = state
            .sales
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| PortError::not_found("SalesEntry", id))?;
        Ok(state.sales.remove(position))
    }

    async fn find_sales(&self, query: &EntryQuery) -> Result<Vec<SalesEntry>, PortError> {
        let state = self.state.read().await;
        Ok(sorted_by_date(
            state
                .sales
                .iter()
                .filter(|e| query.matches(&e.name, e.date))
                .cloned(),
            |e| e.date,
        ))
    }

    async fn sum_sales(&self, query: &EntryQuery) -> Result<HashMap<String, Decimal>, PortError> {
        let state = self.state.read().await;
        sum_by_name(
            state
                .sales
                .iter()
                .filter(|e| query.matches(&e.name, e.date))
                .map(|e| (e.name.as_str(), e.amount)),
        )
    }

    async fn insert_cash(&self, entries: &[CashEntry]) -> Result<usize, PortError> {
        let mut state = self.state.write().await;
        state.ensure_accounts(entries.iter().map(|e| e.name.as_str()))?;
        state.cash.extend_from_slice(entries);
        Ok(entries.len())
    }

    async fn get_cash(&self, id: CashEntryId) -> Result<Option<CashEntry>, PortError> {
        let state = self.state.read().await;
        Ok(state.cash.iter().find(|e| e.id == id).cloned())
    }

    async fn replace_cash(&self, entry: &CashEntry) -> Result<CashEntry, PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .cash
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| PortError::not_found("CashEntry", entry.id))?;
        let replacement = CashEntry {
            name: stored.name.clone(),
            ..entry.clone()
        };
        Ok(std::mem::replace(stored, replacement))
    }

    async fn delete_cash(&self, id: CashEntryId) -> Result<CashEntry, PortError> {
        let mut state = self.state.write().await;
        let position = state
            .cash
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| PortError::not_found("CashEntry", id))?;
        Ok(state.cash.remove(position))
    }

    async fn find_cash(&self, query: &EntryQuery) -> Result<Vec<CashEntry>, PortError> {
        let state = self.state.read().await;
        Ok(sorted_by_date(
            state
                .cash
                .iter()
                .filter(|e| query.matches(&e.name, e.date))
                .cloned(),
            |e| e.date,
        ))
    }

    async fn sum_cash(&self, query: &EntryQuery) -> Result<HashMap<String, Decimal>, PortError> {
        let state = self.state.read().await;
        sum_by_name(
            state
                .cash
                .iter()
                .filter(|e| query.matches(&e.name, e.date))
                .map(|e| (e.name.as_str(), e.amount)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::NewCustomer;
    use rust_decimal_macros::dec;

    async fn store_with(names: &[&str]) -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::new();
        for name in names {
            let customer = NewCustomer::new(*name, "9000000000").into_customer().unwrap();
            let placeholder = CashEntry::opening_placeholder(*name, Utc::now());
            store.create_customer_account(&customer, &placeholder).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_create_account_writes_all_records() {
        let store = store_with(&["A"]).await;
        let snapshot = store.snapshot().await;

        assert_eq!(snapshot.customers.len(), 1);
        assert_eq!(snapshot.cash.len(), 1);
        assert_eq!(snapshot.cash[0].amount, Decimal::ZERO);
        assert_eq!(snapshot.stored_balance("A"), Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_duplicate_account_conflicts() {
        let store = store_with(&["A"]).await;
        let customer = NewCustomer::new("A", "1").into_customer().unwrap();
        let placeholder = CashEntry::opening_placeholder("A", Utc::now());

        let result = store.create_customer_account(&customer, &placeholder).await;
        assert!(result.unwrap_err().is_conflict());
        assert_eq!(store.snapshot().await.cash.len(), 1);
    }

    #[tokio::test]
    async fn test_delta_on_missing_balance_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let result = store.apply_balance_delta("ghost", dec!(5)).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_reports_removed_counts() {
        let store = store_with(&["A", "B"]).await;
        let summary = store.delete_customer("A").await.unwrap();

        assert_eq!(
            summary,
            CascadeSummary {
                customers: 1,
                sales_entries: 0,
                cash_entries: 1,
                balances: 1,
            }
        );
        assert_eq!(store.snapshot().await.customers.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_for_closed_account_writes_nothing() {
        let store = store_with(&["A"]).await;
        let now = Utc::now();
        let entries = vec![
            crate::sales::NewSalesEntry::new("A", "Onion", dec!(20)).into_entry(0, now).unwrap(),
            crate::sales::NewSalesEntry::new("gone", "Onion", dec!(20)).into_entry(1, now).unwrap(),
        ];

        match store.insert_sales(&entries).await {
            Err(PortError::NotFound { key, .. }) => assert_eq!(key, "gone"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert!(store.snapshot().await.sales.is_empty());
    }

    #[tokio::test]
    async fn test_replace_keeps_stored_name() {
        let store = store_with(&["B"]).await;
        let opening = store.snapshot().await.cash[0].clone();
        let stale = CashEntry {
            name: "A".to_string(),
            amount: dec!(40),
            ..opening.clone()
        };

        let previous = store.replace_cash(&stale).await.unwrap();
        assert_eq!(previous, opening);

        let stored = store.get_cash(opening.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "B");
        assert_eq!(stored.amount, dec!(40));
    }
}
