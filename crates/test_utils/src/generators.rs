//! Property-Based Test Generators
//!
//! Proptest strategies for ledger requests, plus `fake` helpers for
//! realistic customer names.

use chrono::{DateTime, Duration, TimeZone, Utc};
use domain_ledger::{NewCashEntry, NewSalesEntry};
use fake::faker::name::en::Name;
use fake::Fake;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for unit prices with up to two decimal places
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for bag counts, including the zero that means "use the default"
pub fn bags_strategy() -> impl Strategy<Value = Option<i64>> {
    prop::option::of(0i64..200)
}

/// Strategy for optional weights and cooly rates, whole or halves
pub fn optional_measure_strategy() -> impl Strategy<Value = Option<Decimal>> {
    prop::option::of((0i64..2_000).prop_map(|halves| Decimal::new(halves * 5, 1)))
}

/// Strategy for signed cash amounts; refunds are negative
pub fn cash_amount_strategy() -> impl Strategy<Value = Decimal> {
    (-50_000i64..500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for entry timestamps within the first quarter of 2024
pub fn entry_date_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..90 * 24).prop_map(|hours| {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    })
}

/// Strategy for a sales request for one of `names`
pub fn new_sales_strategy(names: Vec<String>) -> impl Strategy<Value = NewSalesEntry> {
    (
        prop::sample::select(names),
        price_strategy(),
        bags_strategy(),
        optional_measure_strategy(),
        optional_measure_strategy(),
        entry_date_strategy(),
    )
        .prop_map(|(name, price, bags, weight, cooly, date)| NewSalesEntry {
            name: Some(name),
            item: Some("Onion".to_string()),
            bags,
            weight,
            cooly,
            price: Some(price),
            date: Some(date),
        })
}

/// Strategy for a cash request for one of `names`
pub fn new_cash_strategy(names: Vec<String>) -> impl Strategy<Value = NewCashEntry> {
    (prop::sample::select(names), cash_amount_strategy(), entry_date_strategy())
        .prop_map(|(name, amount, date)| NewCashEntry::new(name, amount).dated(date))
}

/// A random full customer name
pub fn customer_name() -> String {
    Name().fake()
}

/// `count` distinct random customer names
pub fn customer_names(count: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(count);
    while names.len() < count {
        let name = customer_name();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_names_are_distinct() {
        let names = customer_names(5);
        assert_eq!(names.len(), 5);
        for (i, name) in names.iter().enumerate() {
            assert!(!name.trim().is_empty());
            assert!(!names[i + 1..].contains(name));
        }
    }

    proptest! {
        #[test]
        fn generated_sales_name_a_known_customer(
            entry in new_sales_strategy(vec!["A".to_string(), "B".to_string()])
        ) {
            let name = entry.name.unwrap();
            prop_assert!(name == "A" || name == "B");
            prop_assert!(entry.price.unwrap() > Decimal::ZERO);
        }
    }
}
