//! Pre-built Test Fixtures
//!
//! Provides fixed dates, customer requests and ledger activity so tests across
//! crates agree on the same numbers.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use domain_ledger::{NewCashEntry, NewCustomer, NewSalesEntry};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Mid-morning UTC on the given day of January 2024
    pub fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap()
    }

    /// The given day of January 2024 as a calendar date
    pub fn jan_date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    /// The given day of January 2024 in request form (`YYYY-MM-DD`)
    pub fn jan_str(day: u32) -> String {
        Self::jan_date(day).to_string()
    }

    /// A timestamp far enough ahead to count as future-dated
    pub fn next_month() -> DateTime<Utc> {
        Utc::now() + chrono::Duration::days(30)
    }
}

/// Fixture for customer requests
pub struct CustomerFixtures;

impl CustomerFixtures {
    pub const PHONE: &'static str = "9876543210";

    /// A complete customer creation request
    pub fn new_customer(name: &str) -> NewCustomer {
        NewCustomer::new(name, Self::PHONE)
    }
}

/// The worked example ledger used by the bill tests
///
/// Customer "A" buys goods worth 100 on January 1st and 200 on January 3rd,
/// and pays 30 on January 2nd and 50 on January 4th. The stored balance
/// ends at 220.
pub struct ExampleLedger;

impl ExampleLedger {
    pub const CUSTOMER: &'static str = "A";

    /// Sales worth 100 and 200 on days 1 and 3
    pub fn sales() -> Vec<NewSalesEntry> {
        vec![
            // 1 * 90 * 1 + 1 * 10
            NewSalesEntry::new(Self::CUSTOMER, "Onion", dec!(1))
                .with_weight(dec!(90))
                .dated(TemporalFixtures::jan(1)),
            // 1 * 190 * 1 + 1 * 10
            NewSalesEntry::new(Self::CUSTOMER, "Onion", dec!(1))
                .with_weight(dec!(190))
                .dated(TemporalFixtures::jan(3)),
        ]
    }

    /// Payments of 30 and 50 dated days 2 and 4
    pub fn cash() -> Vec<NewCashEntry> {
        vec![
            NewCashEntry::new(Self::CUSTOMER, dec!(30)).dated(TemporalFixtures::jan(2)),
            NewCashEntry::new(Self::CUSTOMER, dec!(50)).dated(TemporalFixtures::jan(4)),
        ]
    }

    pub fn closing_balance() -> Decimal {
        dec!(220)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jan_str_is_request_form() {
        assert_eq!(TemporalFixtures::jan_str(3), "2024-01-03");
    }

    #[test]
    fn test_example_ledger_is_dated_in_order() {
        let sales = ExampleLedger::sales();
        assert!(sales[0].date < sales[1].date);
        assert_eq!(ExampleLedger::cash().len(), 2);
    }
}
