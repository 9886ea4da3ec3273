//! Tests for the sales amount formula

use domain_ledger::amount::{calculate_amount, Quantities, DEFAULT_BAGS, DEFAULT_COOLY, DEFAULT_WEIGHT};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn amount(price: Decimal, bags: Option<i64>, weight: Option<Decimal>, cooly: Option<Decimal>) -> Decimal {
    calculate_amount(price, &Quantities::new(bags, weight, cooly).resolve()).unwrap()
}

mod table {
    use super::*;

    #[test]
    fn test_all_fields_given() {
        assert_eq!(amount(dec!(20), Some(10), Some(dec!(50)), Some(dec!(10))), dec!(10100));
        assert_eq!(amount(dec!(25), Some(10), Some(dec!(50)), Some(dec!(10))), dec!(12600));
    }

    #[test]
    fn test_omitted_fields_use_defaults() {
        // 20 * 50 * 1 + 1 * 10
        assert_eq!(amount(dec!(20), None, None, None), dec!(1010));
    }

    #[test]
    fn test_zero_fields_use_defaults() {
        assert_eq!(
            amount(dec!(20), Some(0), Some(dec!(0)), Some(dec!(0))),
            amount(dec!(20), None, None, None)
        );
    }

    #[test]
    fn test_fractional_values() {
        // 12.5 * 48.5 * 3 + 3 * 7.25
        assert_eq!(amount(dec!(12.5), Some(3), Some(dec!(48.5)), Some(dec!(7.25))), dec!(1840.5));
    }

    #[test]
    fn test_negative_bags_are_kept() {
        // 10 * 50 * -2 + -2 * 10
        assert_eq!(amount(dec!(10), Some(-2), None, None), dec!(-1020));
    }
}

proptest! {
    #[test]
    fn formula_holds_for_any_quantities(
        price in 1i64..100_000,
        bags in prop::option::of(-50i64..500),
        weight in prop::option::of(0i64..1_000),
        cooly in prop::option::of(0i64..100),
    ) {
        let price = Decimal::from(price);
        let weight = weight.map(Decimal::from);
        let cooly = cooly.map(Decimal::from);

        let b = Decimal::from(bags.filter(|b| *b != 0).unwrap_or(DEFAULT_BAGS));
        let w = weight.filter(|w| !w.is_zero()).unwrap_or(DEFAULT_WEIGHT);
        let c = cooly.filter(|c| !c.is_zero()).unwrap_or(DEFAULT_COOLY);

        prop_assert_eq!(amount(price, bags, weight, cooly), price * w * b + b * c);
    }

    #[test]
    fn omitted_and_zero_are_equivalent(price in 1i64..10_000) {
        let price = Decimal::from(price);
        prop_assert_eq!(
            amount(price, None, None, None),
            amount(price, Some(0), Some(Decimal::ZERO), Some(Decimal::ZERO))
        );
    }
}
