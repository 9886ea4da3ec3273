//! Integration tests for the balance mutation engine
//!
//! Covers the worked examples, insert/delete round trips, the running
//! balance invariant over arbitrary operation sequences, and concurrent
//! mutation of one customer.

mod common;

use common::{assert_balances_consistent, service_with};
use domain_ledger::{CashUpdate, LedgerError, NewCashEntry, NewSalesEntry, SalesUpdate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

mod worked_examples {
    use super::*;

    /// Sales then cash, update and delete, each applied to the running balance
    #[tokio::test]
    async fn test_examples_one_to_four() {
        let (service, store) = service_with(&["A"]).await;
        let mutations = service.mutations();

        // opening balance of 500: 9 * 50 * 1 + 1 * 50
        mutations
            .record_sales(vec![NewSalesEntry::new("A", "Rice", dec!(9)).with_cooly(dec!(50))])
            .await
            .unwrap();
        assert_eq!(service.customers().balance_of("A").await.unwrap().balance, dec!(500));

        // Example 1
        let outcome = mutations
            .record_sales(vec![NewSalesEntry::new("A", "Onion", dec!(20))
                .with_weight(dec!(50))
                .with_bags(10)
                .with_cooly(dec!(10))])
            .await
            .unwrap();
        assert_eq!(outcome.balances[0].balance, dec!(10600));
        let sales_id = store.snapshot().await.sales[1].id;

        // Example 2
        let outcome = mutations
            .record_cash(vec![NewCashEntry::new("A", dec!(300))])
            .await
            .unwrap();
        assert_eq!(outcome.balances[0].balance, dec!(10300));
        let cash_id = store.snapshot().await.cash[1].id;

        // Example 3
        let outcome = mutations
            .update_sales(
                sales_id,
                SalesUpdate::new("Onion", dec!(25))
                    .with_weight(dec!(50))
                    .with_bags(10)
                    .with_cooly(dec!(10)),
            )
            .await
            .unwrap();
        assert_eq!(outcome.entry.amount, dec!(12600));
        assert_eq!(outcome.balance.balance, dec!(12800));

        // Example 4
        let outcome = mutations.delete_cash(cash_id).await.unwrap();
        assert_eq!(outcome.entry.amount, dec!(300));
        assert_eq!(outcome.balance.balance, dec!(13100));

        assert_balances_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_update_with_omitted_quantities_uses_defaults() {
        let (service, store) = service_with(&["A"]).await;
        service
            .mutations()
            .record_sales(vec![NewSalesEntry::new("A", "Onion", dec!(20)).with_bags(10)])
            .await
            .unwrap();
        let id = store.snapshot().await.sales[0].id;

        let outcome = service
            .mutations()
            .update_sales(id, SalesUpdate::new("Onion", dec!(20)))
            .await
            .unwrap();

        assert_eq!(outcome.entry.bags, 1);
        assert_eq!(outcome.entry.amount, dec!(1010));
        assert_eq!(outcome.balance.balance, dec!(1010));
    }
}

mod round_trips {
    use super::*;

    #[tokio::test]
    async fn test_sales_insert_then_delete_restores_balance() {
        let (service, store) = service_with(&["A"]).await;
        service
            .mutations()
            .record_cash(vec![NewCashEntry::new("A", dec!(75))])
            .await
            .unwrap();
        let before = service.customers().balance_of("A").await.unwrap();

        service
            .mutations()
            .record_sales(vec![NewSalesEntry::new("A", "Garlic", dec!(3.5)).with_bags(4)])
            .await
            .unwrap();
        let id = store.snapshot().await.sales[0].id;
        service.mutations().delete_sales(id).await.unwrap();

        assert_eq!(service.customers().balance_of("A").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_cash_insert_then_delete_restores_balance() {
        let (service, store) = service_with(&["A"]).await;
        service
            .mutations()
            .record_cash(vec![NewCashEntry::new("A", dec!(-40)).with_cash_type("refund")])
            .await
            .unwrap();
        assert_eq!(service.customers().balance_of("A").await.unwrap().balance, dec!(40));

        let id = store.snapshot().await.cash[1].id;
        service.mutations().delete_cash(id).await.unwrap();

        assert_eq!(service.customers().balance_of("A").await.unwrap().balance, Decimal::ZERO);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn test_cash_without_amount_reports_index() {
        let (service, store) = service_with(&["A"]).await;

        let result = service
            .mutations()
            .record_cash(vec![
                NewCashEntry::new("A", dec!(10)),
                NewCashEntry {
                    name: Some("A".into()),
                    ..Default::default()
                },
            ])
            .await;

        let error = result.unwrap_err();
        assert!(matches!(error, LedgerError::MissingField { index: 1, field: "Amount" }));
        assert_eq!(error.batch_index(), Some(1));
        assert_eq!(store.snapshot().await.cash.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_cash_amount_is_accepted() {
        let (service, _) = service_with(&["A"]).await;

        let outcome = service
            .mutations()
            .record_cash(vec![NewCashEntry::new("A", Decimal::ZERO)])
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.balances[0].balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_update_requires_amount() {
        let (service, store) = service_with(&["A"]).await;
        let placeholder = store.snapshot().await.cash[0].id;

        let result = service
            .mutations()
            .update_cash(placeholder, CashUpdate::default())
            .await;

        assert!(matches!(result, Err(LedgerError::MissingRequestField("Amount"))));
    }
}

mod invariant {
    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Sale { price: i64, bags: i64 },
        Cash { amount: i64 },
        UpdateSale { pick: usize, price: i64 },
        DeleteSale { pick: usize },
        UpdateCash { pick: usize, amount: i64 },
        DeleteCash { pick: usize },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..500, 0i64..6).prop_map(|(price, bags)| Op::Sale { price, bags }),
            (-200i64..2000).prop_map(|amount| Op::Cash { amount }),
            (any::<usize>(), 1i64..500).prop_map(|(pick, price)| Op::UpdateSale { pick, price }),
            any::<usize>().prop_map(|pick| Op::DeleteSale { pick }),
            (any::<usize>(), -200i64..2000).prop_map(|(pick, amount)| Op::UpdateCash { pick, amount }),
            any::<usize>().prop_map(|pick| Op::DeleteCash { pick }),
        ]
    }

    async fn run(ops: Vec<Op>) {
        let (service, store) = service_with(&["A", "B"]).await;
        let mutations = service.mutations();

        for (step, op) in ops.into_iter().enumerate() {
            let name = if step % 2 == 0 { "A" } else { "B" };
            let snapshot = store.snapshot().await;
            match op {
                Op::Sale { price, bags } => {
                    mutations
                        .record_sales(vec![NewSalesEntry::new(name, "Onion", Decimal::from(price)).with_bags(bags)])
                        .await
                        .unwrap();
                }
                Op::Cash { amount } => {
                    mutations
                        .record_cash(vec![NewCashEntry::new(name, Decimal::from(amount))])
                        .await
                        .unwrap();
                }
                Op::UpdateSale { pick, price } if !snapshot.sales.is_empty() => {
                    let id = snapshot.sales[pick % snapshot.sales.len()].id;
                    mutations
                        .update_sales(id, SalesUpdate::new("Garlic", Decimal::from(price)))
                        .await
                        .unwrap();
                }
                Op::DeleteSale { pick } if !snapshot.sales.is_empty() => {
                    let id = snapshot.sales[pick % snapshot.sales.len()].id;
                    mutations.delete_sales(id).await.unwrap();
                }
                Op::UpdateCash { pick, amount } if !snapshot.cash.is_empty() => {
                    let id = snapshot.cash[pick % snapshot.cash.len()].id;
                    mutations
                        .update_cash(id, CashUpdate::new(Decimal::from(amount)))
                        .await
                        .unwrap();
                }
                Op::DeleteCash { pick } if !snapshot.cash.is_empty() => {
                    let id = snapshot.cash[pick % snapshot.cash.len()].id;
                    mutations.delete_cash(id).await.unwrap();
                }
                _ => {}
            }
        }

        assert_balances_consistent(&store).await;
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn balance_matches_surviving_entries(ops in prop::collection::vec(op(), 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(run(ops));
        }
    }
}

mod concurrency {
    use super::*;

    /// Many tasks mutating the same customer lose no update
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mutations_lose_no_updates() {
        let (service, store) = service_with(&["A", "B"]).await;
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for i in 0..50i64 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let name = if i % 5 == 0 { "B" } else { "A" };
                service
                    .mutations()
                    .record_sales(vec![
                        NewSalesEntry::new(name, "Onion", Decimal::from(i + 1)),
                        NewSalesEntry::new("A", "Garlic", dec!(2)).with_bags(2),
                    ])
                    .await
                    .unwrap();
                service
                    .mutations()
                    .record_cash(vec![NewCashEntry::new(name, Decimal::from(i * 3))])
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.sales.len(), 100);
        assert_eq!(snapshot.cash.len(), 52);
        assert_balances_consistent(&store).await;
    }
}
