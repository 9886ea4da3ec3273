//! Cash entry repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{lock_accounts, EntryFilter, NameTotal, ENTRY_FILTER};
use crate::error::DatabaseError;

const CASH_COLUMNS: &str = "entry_id, name, cash_type, amount, entry_date";

/// Cash entry as stored in the `cash_entries` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CashRow {
    pub entry_id: Uuid,
    pub name: String,
    pub cash_type: String,
    pub amount: Decimal,
    pub entry_date: DateTime<Utc>,
}

impl CashRow {
    pub(crate) async fn insert(&self, conn: &mut PgConnection) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO cash_entries (entry_id, name, cash_type, amount, entry_date) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(self.entry_id)
        .bind(&self.name)
        .bind(&self.cash_type)
        .bind(self.amount)
        .bind(self.entry_date)
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// Repository for cash entries
#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: PgPool,
}

impl CashRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a batch of entries in one transaction
    pub async fn insert_batch(&self, rows: &[CashRow]) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_accounts(&mut *tx, rows.iter().map(|r| r.name.as_str())).await?;
        for row in rows {
            row.insert(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    pub async fn get(&self, entry_id: Uuid) -> Result<Option<CashRow>, DatabaseError> {
        let sql = format!("SELECT {CASH_COLUMNS} FROM cash_entries WHERE entry_id = $1");
        let row = sqlx::query_as::<_, CashRow>(&sql)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Overwrites an entry and returns the row it replaced, keeping the
    /// stored `name`
    pub async fn replace(&self, row: &CashRow) -> Result<CashRow, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {CASH_COLUMNS} FROM cash_entries WHERE entry_id = $1 FOR UPDATE");
        let previous = sqlx::query_as::<_, CashRow>(&select)
            .bind(row.entry_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found("CashEntry", row.entry_id))?;

        sqlx::query(
            "UPDATE cash_entries SET cash_type = $2, amount = $3, entry_date = $4 WHERE entry_id = $1",
        )
        .bind(row.entry_id)
        .bind(&row.cash_type)
        .bind(row.amount)
        .bind(row.entry_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(previous)
    }

    /// Deletes an entry and returns it
    pub async fn delete(&self, entry_id: Uuid) -> Result<CashRow, DatabaseError> {
        let sql = format!("DELETE FROM cash_entries WHERE entry_id = $1 RETURNING {CASH_COLUMNS}");
        let row = sqlx::query_as::<_, CashRow>(&sql)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("CashEntry", entry_id))?;
        Ok(row)
    }

    pub async fn find(&self, filter: EntryFilter<'_>) -> Result<Vec<CashRow>, DatabaseError> {
        let sql = format!(
            "SELECT {CASH_COLUMNS} FROM cash_entries WHERE {ENTRY_FILTER} ORDER BY entry_date, seq"
        );
        let rows = sqlx::query_as::<_, CashRow>(&sql)
            .bind(filter.names)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn sum_by_name(&self, filter: EntryFilter<'_>) -> Result<Vec<NameTotal>, DatabaseError> {
        let sql = format!(
            "SELECT name, SUM(amount) AS total FROM cash_entries WHERE {ENTRY_FILTER} GROUP BY name"
        );
        let rows = sqlx::query_as::<_, NameTotal>(&sql)
            .bind(filter.names)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
