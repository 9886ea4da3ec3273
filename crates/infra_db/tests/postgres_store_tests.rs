//! PostgreSQL ledger store integration tests
//!
//! These start a PostgreSQL container and are ignored by default. Run with
//! `cargo test -p infra_db -- --ignored` on a machine with Docker.

use std::sync::Arc;

use core_kernel::{AdapterHealth, HealthCheckable};
use domain_ledger::{
    CascadeSummary, CustomerChanges, DayBillRequest, LedgerError, LedgerStore, NewCashEntry, SalesEntry,
    NewSalesEntry, RangeBillRequest,
};
use rust_decimal_macros::dec;
use test_utils::{
    assert_range_chains, cash_entry, db_test, ExampleLedger, SalesEntryBuilder, TemporalFixtures,
    TestLedgerBuilder,
};

fn example_ledger() -> TestLedgerBuilder {
    TestLedgerBuilder::new()
        .with_customer(ExampleLedger::CUSTOMER)
        .with_sales(ExampleLedger::sales())
        .with_cash(ExampleLedger::cash())
}

db_test!(test_health_check_reports_healthy, |db| {
    let result = db.ledger_store().health_check().await;
    assert_eq!(result.status, AdapterHealth::Healthy);
    assert_eq!(result.adapter_id, "postgres-ledger-store");
});

db_test!(test_bills_match_in_memory_store, |db| {
    let postgres = db.seed(example_ledger()).await;
    let memory = example_ledger().build().await;

    assert_eq!(
        postgres.customers().balance_of("A").await.unwrap().balance,
        ExampleLedger::closing_balance()
    );

    let range = RangeBillRequest::new("A", TemporalFixtures::jan_str(1), TemporalFixtures::jan_str(5));
    let from_postgres = postgres.bills().customer_bill_range(&range).await.unwrap();
    let from_memory = memory.service.bills().customer_bill_range(&range).await.unwrap();
    assert_eq!(from_postgres, from_memory);
    assert_range_chains(&from_postgres);

    let day = DayBillRequest::on(TemporalFixtures::jan_str(3));
    assert_eq!(
        postgres.bills().owner_bill(&day).await.unwrap(),
        memory.service.bills().owner_bill(&day).await.unwrap()
    );
});

db_test!(test_entry_round_trip_restores_balance, |db| {
    let store = db.ledger_store();
    let service = TestLedgerBuilder::new().with_customer("A").seed(Arc::new(store.clone())).await;

    service
        .mutations()
        .record_sales(vec![NewSalesEntry::new("A", "Onion", dec!(20)).with_bags(10)])
        .await
        .unwrap();
    let sales = store
        .find_sales(&domain_ledger::EntryQuery::for_name(
            "A",
            core_kernel::DateWindow::from(TemporalFixtures::jan(1)),
        ))
        .await
        .unwrap();
    assert_eq!(sales.len(), 1);

    let outcome = service.mutations().delete_sales(sales[0].id).await.unwrap();
    assert_eq!(outcome.entry, sales[0]);
    assert_eq!(outcome.balance.balance, dec!(0));
});

db_test!(test_rename_and_delete_cascade, |db| {
    let store = db.ledger_store();
    let service = TestLedgerBuilder::new()
        .with_customers(&["A", "B"])
        .with_sales(vec![NewSalesEntry::new("A", "Onion", dec!(20)).dated(TemporalFixtures::jan(3))])
        .with_cash(vec![NewCashEntry::new("A", dec!(10)).dated(TemporalFixtures::jan(4))])
        .seed(Arc::new(store.clone()))
        .await;

    let a = store.find_customer_by_name("A").await.unwrap().unwrap();
    let conflict = service
        .customers()
        .update_customer(a.id, CustomerChanges::rename("B"))
        .await
        .unwrap_err();
    assert!(matches!(conflict, LedgerError::DuplicateCustomer(_)));
    assert_eq!(store.get_balance("A").await.unwrap().unwrap().balance, dec!(1000));

    service
        .customers()
        .update_customer(a.id, CustomerChanges::rename("Z"))
        .await
        .unwrap();
    assert!(store.get_balance("A").await.unwrap().is_none());
    assert_eq!(store.get_balance("Z").await.unwrap().unwrap().balance, dec!(1000));

    let summary = service.customers().delete_customer("Z").await.unwrap();
    assert_eq!(
        summary,
        CascadeSummary {
            customers: 1,
            sales_entries: 1,
            cash_entries: 2,
            balances: 1,
        }
    );
});

db_test!(test_concurrent_deltas_are_serialized, |db| {
    let store = Arc::new(db.ledger_store());
    let service = Arc::new(TestLedgerBuilder::new().with_customer("A").seed(store.clone()).await);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .mutations()
                .record_cash(vec![NewCashEntry::new("A", dec!(5))])
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.get_balance("A").await.unwrap().unwrap().balance, dec!(-100));
});

#[tokio::test]
#[ignore = "requires docker"]
async fn test_cleared_database_starts_empty() {
    let db = test_utils::get_shared_test_database().await;
    db.clear_data().await.unwrap();
    let service = db.seed(TestLedgerBuilder::new().with_customers(&["A", "B"])).await;
    assert_eq!(service.customers().balance_report().await.unwrap().len(), 2);

    db.clear_data().await.unwrap();
    assert!(db.ledger_store().list_balances().await.unwrap().is_empty());
}

db_test!(test_replace_keeps_stored_customer_name, |db| {
    let store = db.ledger_store();
    TestLedgerBuilder::new().with_customer("B").seed(Arc::new(store.clone())).await;
    let entry = SalesEntryBuilder::new("B").with_bags(10).dated(TemporalFixtures::jan(3)).build();
    store.insert_sales(std::slice::from_ref(&entry)).await.unwrap();

    let stale = SalesEntry {
        name: "A".to_string(),
        price: dec!(25),
        ..entry.clone()
    };
    let previous = store.replace_sales(&stale).await.unwrap();
    assert_eq!(previous.name, "B");

    let stored = store.get_sales(entry.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "B");
    assert_eq!(stored.price, dec!(25));
});

db_test!(test_insert_for_missing_account_writes_nothing, |db| {
    let store = db.ledger_store();
    TestLedgerBuilder::new().with_customer("A").seed(Arc::new(store.clone())).await;

    let batch = vec![
        cash_entry("A", dec!(10), TemporalFixtures::jan(2)),
        cash_entry("closed", dec!(10), TemporalFixtures::jan(2)),
    ];
    let error = store.insert_cash(&batch).await.unwrap_err();
    assert!(error.is_not_found());

    for entry in &batch {
        assert!(store.get_cash(entry.id).await.unwrap().is_none());
    }
});
