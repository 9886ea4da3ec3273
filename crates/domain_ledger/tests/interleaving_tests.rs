//! Customer cascades committing between an engine's read and its write
//!
//! `InterleavingStore` wraps the in-memory store and commits one cascade
//! just before the next entry write reaches the store, which is the widest
//! window a concurrent request can hit.

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{assert_balances_consistent, jan};
use core_kernel::{
    BusinessCalendar, CashEntryId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable,
    PortError, SalesEntryId,
};
use domain_ledger::adapters::InMemoryLedgerStore;
use domain_ledger::{
    Balance, CascadeSummary, CashEntry, CashUpdate, Customer, EntryQuery,
    LedgerError, LedgerService, LedgerStore, NewCashEntry, NewCustomer, NewSalesEntry, SalesEntry,
    SalesUpdate,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
enum Cascade {
    Rename { from: String, to: String },
    Delete(String),
}

struct InterleavingStore {
    inner: InMemoryLedgerStore,
    pending: Mutex<Option<Cascade>>,
}

impl InterleavingStore {
    fn new(inner: InMemoryLedgerStore) -> Self {
        Self {
            inner,
            pending: Mutex::new(None),
        }
    }

    /// Queues a cascade to commit just before the next entry write
    fn before_next_write(&self, cascade: Cascade) {
        *self.pending.lock().unwrap() = Some(cascade);
    }

    async fn commit_pending(&self) {
        let pending = self.pending.lock().unwrap().take();
        match pending {
            Some(Cascade::Rename { from, to }) => {
                let mut customer = self.inner.find_customer_by_name(&from).await.unwrap().unwrap();
                customer.name = to;
                self.inner.update_customer(&from, &customer).await.unwrap();
            }
            Some(Cascade::Delete(name)) => {
                self.inner.delete_customer(&name).await.unwrap();
            }
            None => {}
        }
    }
}

impl DomainPort for InterleavingStore {}

#[async_trait]
impl HealthCheckable for InterleavingStore {
    async fn health_check(&self) -> HealthCheckResult {
        self.inner.health_check().await
    }
}

#[async_trait]
impl LedgerStore for InterleavingStore {
    async fn create_customer_account(&self, customer: &Customer, opening_cash: &CashEntry) -> Result<(), PortError> {
        self.inner.create_customer_account(customer, opening_cash).await
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        self.inner.find_customer(id).await
    }

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>, PortError> {
        self.inner.find_customer_by_name(name).await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, PortError> {
        self.inner.list_customers().await
    }

    async fn update_customer(&self, previous_name: &str, customer: &Customer) -> Result<(), PortError> {
        self.inner.update_customer(previous_name, customer).await
    }

    async fn delete_customer(&self, name: &str) -> Result<CascadeSummary, PortError> {
        self.inner.delete_customer(name).await
    }

    async fn get_balance(&self, name: &str) -> Result<Option<Balance>, PortError> {
        self.inner.get_balance(name).await
    }

    async fn get_balances(&self, names: &[String]) -> Result<Vec<Balance>, PortError> {
        self.inner.get_balances(names).await
    }

    async fn list_balances(&self) -> Result<Vec<Balance>, PortError> {
        self.inner.list_balances().await
    }

    async fn apply_balance_delta(&self, name: &str, delta: Decimal) -> Result<Decimal, PortError> {
        self.inner.apply_balance_delta(name, delta).await
    }

    async fn insert_sales(&self, entries: &[SalesEntry]) -> Result<usize, PortError> {
        self.commit_pending().await;
        self.inner.insert_sales(entries).await
    }

    async fn get_sales(&self, id: SalesEntryId) -> Result<Option<SalesEntry>, PortError> {
        self.inner.get_sales(id).await
    }

    async fn replace_sales(&self, entry: &SalesEntry) -> Result<SalesEntry, PortError> {
        self.commit_pending().await;
        self.inner.replace_sales(entry).await
    }

    async fn delete_sales(&self, id: SalesEntryId) -> Result<SalesEntry, PortError> {
        self.inner.delete_sales(id).await
    }

    async fn find_sales(&self, query: &EntryQuery) -> Result<Vec<SalesEntry>, PortError> {
        self.inner.find_sales(query).await
    }

    async fn sum_sales(&self, query: &EntryQuery) -> Result<HashMap<String, Decimal>, PortError> {
        self.inner.sum_sales(query).await
    }

    async fn insert_cash(&self, entries: &[CashEntry]) -> Result<usize, PortError> {
        self.commit_pending().await;
        self.inner.insert_cash(entries).await
    }

    async fn get_cash(&self, id: CashEntryId) -> Result<Option<CashEntry>, PortError> {
        self.inner.get_cash(id).await
    }

    async fn replace_cash(&self, entry: &CashEntry) -> Result<CashEntry, PortError> {
        self.commit_pending().await;
        self.inner.replace_cash(entry).await
    }

    async fn delete_cash(&self, id: CashEntryId) -> Result<CashEntry, PortError> {
        self.inner.delete_cash(id).await
    }

    async fn find_cash(&self, query: &EntryQuery) -> Result<Vec<CashEntry>, PortError> {
        self.inner.find_cash(query).await
    }

    async fn sum_cash(&self, query: &EntryQuery) -> Result<HashMap<String, Decimal>, PortError> {
        self.inner.sum_cash(query).await
    }
}

async fn interleaved(names: &[&str]) -> (LedgerService, Arc<InterleavingStore>, InMemoryLedgerStore) {
    let memory = InMemoryLedgerStore::new();
    let store = Arc::new(InterleavingStore::new(memory.clone()));
    let service = LedgerService::new(store.clone(), BusinessCalendar::default());
    for name in names {
        service
            .customers()
            .create_customer(NewCustomer::new(*name, "9876543210"))
            .await
            .unwrap();
    }
    (service, store, memory)
}

fn rename(from: &str, to: &str) -> Cascade {
    Cascade::Rename {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[tokio::test]
async fn test_sales_update_follows_rename_committed_before_replace() {
    let (service, store, memory) = interleaved(&["A"]).await;
    service
        .mutations()
        .record_sales(vec![NewSalesEntry::new("A", "Onion", dec!(20)).with_bags(10).dated(jan(3))])
        .await
        .unwrap();
    let id = memory.snapshot().await.sales[0].id;

    store.before_next_write(rename("A", "B"));
    let outcome = service
        .mutations()
        .update_sales(id, SalesUpdate::new("Onion", dec!(25)).with_bags(10))
        .await
        .unwrap();

    // 25 * 50 * 10 + 10 * 10
    assert_eq!(outcome.entry.name, "B");
    assert_eq!(outcome.balance, Balance::new("B", dec!(12600)));

    let snapshot = memory.snapshot().await;
    assert_eq!(snapshot.sales[0].name, "B");
    assert_eq!(snapshot.stored_balance("B"), Some(dec!(12600)));
    assert_eq!(snapshot.stored_balance("A"), None);
    assert_balances_consistent(&memory).await;
}

#[tokio::test]
async fn test_cash_update_follows_rename_committed_before_replace() {
    let (service, store, memory) = interleaved(&["A"]).await;
    service
        .mutations()
        .record_cash(vec![NewCashEntry::new("A", dec!(300))])
        .await
        .unwrap();
    let id = memory.snapshot().await.cash[1].id;

    store.before_next_write(rename("A", "B"));
    let outcome = service
        .mutations()
        .update_cash(id, CashUpdate::new(dec!(200)))
        .await
        .unwrap();

    assert_eq!(outcome.entry.name, "B");
    assert_eq!(outcome.balance.balance, dec!(-200));
    assert!(memory.snapshot().await.cash.iter().all(|e| e.name == "B"));
    assert_balances_consistent(&memory).await;
}

#[tokio::test]
async fn test_sales_batch_for_customer_deleted_mid_request_writes_nothing() {
    let (service, store, memory) = interleaved(&["A", "B"]).await;

    store.before_next_write(Cascade::Delete("B".to_string()));
    let result = service
        .mutations()
        .record_sales(vec![
            NewSalesEntry::new("A", "Onion", dec!(20)),
            NewSalesEntry::new("B", "Onion", dec!(20)),
        ])
        .await;

    assert!(matches!(
        result,
        Err(LedgerError::CustomerNotFound { ref name, index: 1 }) if name == "B"
    ));
    let snapshot = memory.snapshot().await;
    assert!(snapshot.sales.is_empty());
    assert_eq!(snapshot.stored_balance("A"), Some(dec!(0)));
    assert_balances_consistent(&memory).await;
}

#[tokio::test]
async fn test_cash_batch_for_customer_deleted_mid_request_writes_nothing() {
    let (service, store, memory) = interleaved(&["A"]).await;

    store.before_next_write(Cascade::Delete("A".to_string()));
    let result = service
        .mutations()
        .record_cash(vec![NewCashEntry::new("A", dec!(50))])
        .await;

    assert!(matches!(result, Err(LedgerError::CustomerNotFound { index: 0, .. })));
    assert!(memory.snapshot().await.cash.is_empty());
}
