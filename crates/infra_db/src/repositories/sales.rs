//! Sales entry repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{lock_accounts, EntryFilter, NameTotal, ENTRY_FILTER};
use crate::error::DatabaseError;

const SALES_COLUMNS: &str = "entry_id, name, item, bags, weight, cooly, price, amount, entry_date";

/// Sales entry as stored in the `sales_entries` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SalesRow {
    pub entry_id: Uuid,
    pub name: String,
    pub item: String,
    pub bags: i64,
    pub weight: Decimal,
    pub cooly: Decimal,
    pub price: Decimal,
    pub amount: Decimal,
    pub entry_date: DateTime<Utc>,
}

impl SalesRow {
    async fn insert(&self, conn: &mut PgConnection) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO sales_entries (entry_id, name, item, bags, weight, cooly, price, amount, entry_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.entry_id)
        .bind(&self.name)
        .bind(&self.item)
        .bind(self.bags)
        .bind(self.weight)
        .bind(self.cooly)
        .bind(self.price)
        .bind(self.amount)
        .bind(self.entry_date)
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// Repository for sales entries
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a batch of entries in one transaction
    ///
    /// # Returns
    ///
    /// The number of inserted rows
    pub async fn insert_batch(&self, rows: &[SalesRow]) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_accounts(&mut *tx, rows.iter().map(|r| r.name.as_str())).await?;
        for row in rows {
            row.insert(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    pub async fn get(&self, entry_id: Uuid) -> Result<Option<SalesRow>, DatabaseError> {
        let sql = format!("SELECT {SALES_COLUMNS} FROM sales_entries WHERE entry_id = $1");
        let row = sqlx::query_as::<_, SalesRow>(&sql)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Overwrites an entry and returns the row it replaced
    ///
    /// The previous row is locked for the duration of the write. `name` is
    /// left alone; only customer cascades move an entry between names.
    pub async fn replace(&self, row: &SalesRow) -> Result<SalesRow, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {SALES_COLUMNS} FROM sales_entries WHERE entry_id = $1 FOR UPDATE");
        let previous = sqlx::query_as::<_, SalesRow>(&select)
            .bind(row.entry_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found("SalesEntry", row.entry_id))?;

        sqlx::query(
            r#"
            UPDATE sales_entries
            SET item = $2, bags = $3, weight = $4, cooly = $5,
                price = $6, amount = $7, entry_date = $8
            WHERE entry_id = $1
            "#,
        )
        .bind(row.entry_id)
        .bind(&row.item)
        .bind(row.bags)
        .bind(row.weight)
        .bind(row.cooly)
        .bind(row.price)
        .bind(row.amount)
        .bind(row.entry_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(previous)
    }

    /// Deletes an entry and returns it
    pub async fn delete(&self, entry_id: Uuid) -> Result<SalesRow, DatabaseError> {
        let sql = format!("DELETE FROM sales_entries WHERE entry_id = $1 RETURNING {SALES_COLUMNS}");
        let row = sqlx::query_as::<_, SalesRow>(&sql)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("SalesEntry", entry_id))?;
        Ok(row)
    }

    pub async fn find(&self, filter: EntryFilter<'_>) -> Result<Vec<SalesRow>, DatabaseError> {
        let sql = format!(
            "SELECT {SALES_COLUMNS} FROM sales_entries WHERE {ENTRY_FILTER} ORDER BY entry_date, seq"
        );
        let rows = sqlx::query_as::<_, SalesRow>(&sql)
            .bind(filter.names)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Sums amounts per customer within the filter
    pub async fn sum_by_name(&self, filter: EntryFilter<'_>) -> Result<Vec<NameTotal>, DatabaseError> {
        let sql = format!(
            "SELECT name, SUM(amount) AS total FROM sales_entries WHERE {ENTRY_FILTER} GROUP BY name"
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
