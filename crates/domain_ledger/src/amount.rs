//! Sales amount derivation
//!
//! Every sales entry carries a cached `Amount` derived from its price and
//! quantity fields:
//!
//! ```text
//! Amount = Price * (Weight or 50) * (Bags or 1) + (Bags or 1) * (Cooly or 10)
//! ```
//!
//! A quantity falls back to its default when it is absent or zero. An
//! explicit `0` weight therefore means "a standard 50 unit bag", not an
//! empty one. Negative quantities are kept as given.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bags per entry when none are given
pub const DEFAULT_BAGS: i64 = 1;

/// Weight per bag when none is given
pub const DEFAULT_WEIGHT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Handling charge (cooly) per bag when none is given
pub const DEFAULT_COOLY: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Errors raised while deriving an amount
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount overflow: price={price}, weight={weight}, bags={bags}, cooly={cooly}")]
    Overflow {
        price: Decimal,
        weight: Decimal,
        bags: i64,
        cooly: Decimal,
    },

    #[error("Balance delta overflow for customer '{0}'")]
    DeltaOverflow(String),
}

/// Quantity fields as supplied by a caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantities {
    pub bags: Option<i64>,
    pub weight: Option<Decimal>,
    pub cooly: Option<Decimal>,
}

/// Quantity fields with defaults applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedQuantities {
    pub bags: i64,
    pub weight: Decimal,
    pub cooly: Decimal,
}

impl Quantities {
    pub fn new(bags: Option<i64>, weight: Option<Decimal>, cooly: Option<Decimal>) -> Self {
        Self { bags, weight, cooly }
    }

    /// Applies the defaults to absent or zero fields
    pub fn resolve(&self) -> ResolvedQuantities {
        ResolvedQuantities {
            bags: self.bags.filter(|b| *b != 0).unwrap_or(DEFAULT_BAGS),
            weight: self.weight.filter(|w| !w.is_zero()).unwrap_or(DEFAULT_WEIGHT),
            cooly: self.cooly.filter(|c| !c.is_zero()).unwrap_or(DEFAULT_COOLY),
        }
    }
}

impl Default for ResolvedQuantities {
    fn default() -> Self {
        Quantities::default().resolve()
    }
}

/// Derives the amount of a sales entry
///
/// # Errors
///
/// Returns `AmountError::Overflow` if the result does not fit a `Decimal`
///
/// # Example
///
/// ```rust
/// use domain_ledger::amount::{calculate_amount, Quantities};
/// use rust_decimal::Decimal;
///
/// let quantities = Quantities::new(Some(10), Some(Decimal::from(50)), Some(Decimal::from(10)));
/// let amount = calculate_amount(Decimal::from(20), &quantities.resolve()).unwrap();
/// assert_eq!(amount, Decimal::from(10_100));
/// ```
pub fn calculate_amount(price: Decimal, quantities: &ResolvedQuantities) -> Result<Decimal, AmountError> {
    let bags = Decimal::from(quantities.bags);
    let overflow = || AmountError::Overflow {
        price,
        weight: quantities.weight,
        bags: quantities.bags,
        cooly: quantities.cooly,
    };

    let goods = price
        .checked_mul(quantities.weight)
        .and_then(|v| v.checked_mul(bags))
        .ok_or_else(overflow)?;
    let handling = bags.checked_mul(quantities.cooly).ok_or_else(overflow)?;

    goods.checked_add(handling).ok_or_else(overflow)
}
