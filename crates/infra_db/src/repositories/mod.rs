//! Repository implementations for the ledger tables
//!
//! Each repository owns the SQL for one table and maps rows with
//! `sqlx::FromRow`. Queries are built at runtime, so the crate compiles
//! without a live database.
//!
//! Sales and cash entries are returned in date order, ties broken by the
//! `seq` column that records insertion order.

pub mod balance;
pub mod cash;
pub mod customer;
pub mod sales;

pub use balance::{BalanceRepository, BalanceRow};
pub use cash::{CashRepository, CashRow};
pub use customer::{CascadeCounts, CustomerRepository, CustomerRow};
pub use sales::{SalesRepository, SalesRow};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::error::DatabaseError;

/// Selects entries by customer name and a half-open date window
#[derive(Debug, Clone, Copy)]
pub struct EntryFilter<'a> {
    /// Restrict to these names, None means every customer
    pub names: Option<&'a [String]>,
    /// Inclusive lower bound
    pub start: DateTime<Utc>,
    /// Exclusive upper bound, None means unbounded
    pub end: Option<DateTime<Utc>>,
}

/// WHERE clause binding an `EntryFilter` as `$1`, `$2` and `$3`
pub(crate) const ENTRY_FILTER: &str = "($1::text[] IS NULL OR name = ANY($1)) \
     AND entry_date >= $2 \
     AND ($3::timestamptz IS NULL OR entry_date < $3)";

/// Per-customer amount total
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct NameTotal {
    pub name: String,
    pub total: Decimal,
}

/// Share-locks the balance row of every name inside an entry-insert
/// transaction
///
/// Rename and delete cascades touch the balance row before any entry, so
/// they wait for the insert to commit and then carry its rows along.
///
/// # Errors
///
/// `DatabaseError::NotFound` for the first name without a balance row
pub(crate) async fn lock_accounts<'a>(
    conn: &mut PgConnection,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), DatabaseError> {
    let mut wanted: Vec<String> = Vec::new();
    for name in names {
        if !wanted.iter().any(|w| w == name) {
            wanted.push(name.to_string());
        }
    }

    let locked: Vec<String> =
        sqlx::query_scalar("SELECT name FROM balances WHERE name = ANY($1) FOR SHARE")
            .bind(&wanted)
            .fetch_all(conn)
            .await?;

    match wanted.into_iter().find(|name| !locked.contains(name)) {
        Some(missing) => Err(DatabaseError::not_found("Balance", missing)),
        None => Ok(()),
    }
}
