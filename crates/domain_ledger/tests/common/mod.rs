//! Shared setup for ledger integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::BusinessCalendar;
use domain_ledger::adapters::InMemoryLedgerStore;
use domain_ledger::{LedgerService, NewCustomer};
use std::sync::Arc;

/// A service over a fresh in-memory store, plus the store for inspection
pub async fn service_with(names: &[&str]) -> (LedgerService, InMemoryLedgerStore) {
    let store = InMemoryLedgerStore::new();
    let service = LedgerService::new(Arc::new(store.clone()), BusinessCalendar::default());
    for name in names {
        service
            .customers()
            .create_customer(NewCustomer::new(*name, "9876543210"))
            .await
            .unwrap();
    }
    (service, store)
}

/// Mid-morning UTC on the given day of January 2024
pub fn jan(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap()
}

/// Asserts the stored balance of every customer equals Σ sales − Σ cash
pub async fn assert_balances_consistent(store: &InMemoryLedgerStore) {
    let snapshot = store.snapshot().await;
    for balance in &snapshot.balances {
        assert_eq!(
            balance.balance,
            snapshot.recomputed_balance(&balance.name),
            "stored balance of '{}' drifted from its entries",
            balance.name
        );
    }
}
