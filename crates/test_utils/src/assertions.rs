//! Custom Test Assertions
//!
//! Assertion helpers for ledger state and reconstructed bills that report
//! the offending customer or row instead of a bare inequality.

use domain_ledger::adapters::LedgerSnapshot;
use domain_ledger::{CustomerBill, RangeBill};
use rust_decimal::Decimal;

/// Asserts every stored balance equals its customer's sales minus cash
///
/// # Panics
///
/// Panics naming the first customer whose stored balance has drifted
pub fn assert_snapshot_consistent(snapshot: &LedgerSnapshot) {
    for balance in &snapshot.balances {
        let recomputed = snapshot.recomputed_balance(&balance.name);
        assert_eq!(
            balance.balance, recomputed,
            "Stored balance of '{}' is {}, entries sum to {}",
            balance.name, balance.balance, recomputed
        );
    }
}

/// Asserts a day bill closes: balance = BF + sales - cash
pub fn assert_bill_closes(bill: &CustomerBill) {
    let items: Decimal = bill.items.iter().map(|line| line.amount).sum();
    let cash: Decimal = bill.cash.iter().map(|line| line.amount).sum();

    assert_eq!(bill.total_sales, items, "Sales lines of '{}' do not add up", bill.name);
    assert_eq!(bill.total_cash, cash, "Cash lines of '{}' do not add up", bill.name);
    assert_eq!(
        bill.balance,
        bill.brought_forward + bill.total_sales - bill.total_cash,
        "Bill of '{}' on {} does not close",
        bill.name,
        bill.date
    );
}

/// Asserts a range bill is a chain: each row opens at the previous close
///
/// # Panics
///
/// Panics naming the first row that breaks the chain
pub fn assert_range_chains(bill: &RangeBill) {
    let mut running = bill.brought_forward;
    let mut previous = None;

    for row in &bill.rows {
        if let Some(date) = previous {
            assert!(row.date > date, "Rows of '{}' are not in date order at {}", bill.name, row.date);
        }
        assert_eq!(
            row.brought_forward, running,
            "Row {} of '{}' opens at {}, previous row closed at {}",
            row.date, bill.name, row.brought_forward, running
        );
        assert_eq!(
            row.balance,
            row.brought_forward + row.total_sales - row.total_cash,
            "Row {} of '{}' does not close",
            row.date,
            bill.name
        );
        running = row.balance;
        previous = Some(row.date);
    }

    assert_eq!(bill.closing_balance, running, "Closing balance of '{}' is off", bill.name);
}
