//! Customer account repository
//!
//! Customers own a balance record and any number of sales and cash entries,
//! all keyed by customer name. Opening, renaming and removing an account
//! therefore touch every ledger table and run inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::repositories::cash::CashRow;

/// Customer record as stored in the `customers` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CustomerRow {
    pub customer_id: Uuid,
    pub name: String,
    pub number: String,
    pub created_at: DateTime<Utc>,
}

/// Row counts removed by a customer cascade delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeCounts {
    pub customers: u64,
    pub sales_entries: u64,
    pub cash_entries: u64,
    pub balances: u64,
}

/// Repository for customer accounts and the cascades that span the ledger
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens an account: customer row, opening cash row and a zero balance
    ///
    /// A balance row left behind for the same name is reset to zero.
    ///
    /// # Errors
    ///
    /// `DatabaseError::DuplicateEntry` if the name is already taken
    pub async fn open_account(
        &self,
        customer_id: Uuid,
        name: &str,
        number: &str,
        opening_cash: &CashRow,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO customers (customer_id, name, number) VALUES ($1, $2, $3)")
            .bind(customer_id)
            .bind(name)
            .bind(number)
            .execute(&mut *tx)
            .await?;

        opening_cash.insert(&mut *tx).await?;

        sqlx::query(
            r#"
            INSERT INTO balances (name, balance) VALUES ($1, 0)
            ON CONFLICT (name) DO UPDATE SET balance = 0
            "#,
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(customer = %name, "Opened customer account");
        Ok(())
    }

    pub async fn get_by_id(&self, customer_id: Uuid) -> Result<Option<CustomerRow>, DatabaseError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT customer_id, name, number, created_at FROM customers WHERE customer_id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<CustomerRow>, DatabaseError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT customer_id, name, number, created_at FROM customers WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Lists customers in creation order
    pub async fn list(&self) -> Result<Vec<CustomerRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT customer_id, name, number, created_at FROM customers ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Rewrites a customer, renaming every ledger record when the name changes
    ///
    /// # Errors
    ///
    /// - `DatabaseError::NotFound` if no customer has this id
    /// - `DatabaseError::DuplicateEntry` if the new name belongs to someone else
    pub async fn update(
        &self,
        customer_id: Uuid,
        previous_name: &str,
        name: &str,
        number: &str,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE customers SET name = $2, number = $3 WHERE customer_id = $1")
            .bind(customer_id)
            .bind(name)
            .bind(number)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Customer", customer_id));
        }

        if previous_name != name {
            // Balance row first, see `lock_accounts`
            for statement in [
                "UPDATE balances SET name = $2 WHERE name = $1",
                "UPDATE sales_entries SET name = $2 WHERE name = $1",
                "UPDATE cash_entries SET name = $2 WHERE name = $1",
            ] {
                sqlx::query(statement)
                    .bind(previous_name)
                    .bind(name)
                    .execute(&mut *tx)
                    .await?;
            }
            debug!(from = %previous_name, to = %name, "Renamed customer records");
        }

        tx.commit().await?;
        Ok(())
    }

    /// Removes a customer and every ledger row bearing its name
    ///
    /// # Errors
    ///
    /// `DatabaseError::NotFound` if no customer has this name
    pub async fn delete_cascade(&self, name: &str) -> Result<CascadeCounts, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let customers = sqlx::query("DELETE FROM customers WHERE name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if customers == 0 {
            return Err(DatabaseError::not_found("Customer", name));
        }

        // Balance row first: entry inserts hold it FOR SHARE until they commit
        let balances = sqlx::query("DELETE FROM balances WHERE name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let sales_entries = sqlx::query("DELETE FROM sales_entries WHERE name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let cash_entries = sqlx::query("DELETE FROM cash_entries WHERE name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(CascadeCounts {
            customers,
            sales_entries,
            cash_entries,
            balances,
        })
    }
}
