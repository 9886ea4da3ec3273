//! Running balances and balance deltas
//!
//! Each customer has exactly one running balance equal to the sum of their
//! sales amounts minus the sum of their cash amounts. The balance is never
//! recomputed from history; it is moved by signed deltas.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::amount::AmountError;

/// The stored running balance of a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Balance {
    pub name: String,
    pub balance: Decimal,
}

impl Balance {
    pub fn new(name: impl Into<String>, balance: Decimal) -> Self {
        Self {
            name: name.into(),
            balance,
        }
    }

    /// The balance written when a customer account is opened
    pub fn opening(name: impl Into<String>) -> Self {
        Self::new(name, Decimal::ZERO)
    }
}

/// A signed change to one customer's balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDelta {
    pub name: String,
    pub delta: Decimal,
}

impl BalanceDelta {
    pub fn new(name: impl Into<String>, delta: Decimal) -> Self {
        Self {
            name: name.into(),
            delta,
        }
    }
}

/// Groups signed amounts by customer into one delta per customer
///
/// Deltas are returned in the order each customer first appears.
///
/// # Errors
///
/// Returns `AmountError::Overflow` if a group sum does not fit a `Decimal`
pub fn accumulate_deltas<'a, I>(amounts: I) -> Result<Vec<BalanceDelta>, AmountError>
where
    I: IntoIterator<Item = (&'a str, Decimal)>,
{
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut deltas: Vec<BalanceDelta> = Vec::new();

    for (name, amount) in amounts {
        match positions.get(name) {
            Some(&position) => {
                let current = &mut deltas[position];
                current.delta = current
                    .delta
                    .checked_add(amount)
                    .ok_or_else(|| AmountError::DeltaOverflow(name.to_string()))?;
            }
            None => {
                positions.insert(name, deltas.len());
                deltas.push(BalanceDelta::new(name, amount));
            }
        }
    }

    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accumulate_groups_same_customer() {
        let deltas = accumulate_deltas(vec![
            ("A", dec!(100)),
            ("B", dec!(5)),
            ("A", dec!(-30)),
        ])
        .unwrap();

        assert_eq!(
            deltas,
            vec![BalanceDelta::new("A", dec!(70)), BalanceDelta::new("B", dec!(5))]
        );
    }

    #[test]
    fn test_accumulate_empty() {
        let deltas = accumulate_deltas(Vec::<(&str, Decimal)>::new()).unwrap();
        assert!(deltas.is_empty());
    }
}
