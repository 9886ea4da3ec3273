//! Running balance repository

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BalanceRow {
    pub name: String,
    pub balance: Decimal,
}

/// Repository for the per-customer running balance
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    pool: PgPool,
}

impl BalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, name: &str) -> Result<Option<BalanceRow>, DatabaseError> {
        let row = sqlx::query_as::<_, BalanceRow>("SELECT name, balance FROM balances WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Fetches the balances that exist among `names`
    pub async fn get_many(&self, names: &[String]) -> Result<Vec<BalanceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            "SELECT name, balance FROM balances WHERE name = ANY($1) ORDER BY seq",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list(&self) -> Result<Vec<BalanceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BalanceRow>("SELECT name, balance FROM balances ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Adds `delta` to the stored balance in a single statement
    ///
    /// The row lock taken by the UPDATE serializes concurrent deltas for the
    /// same customer.
    ///
    /// # Returns
    ///
    /// The new balance, or `DatabaseError::NotFound` if the row is missing
    pub async fn apply_delta(&self, name: &str, delta: Decimal) -> Result<Decimal, DatabaseError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "UPDATE balances SET balance = balance + $2 WHERE name = $1 RETURNING balance",
        )
        .bind(name)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Balance", name))?;
        Ok(balance)
    }
}
