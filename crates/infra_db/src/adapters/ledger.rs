//! PostgreSQL Ledger Adapter
//!
//! `PostgresLedgerStore` implements the `LedgerStore` port on top of the
//! table repositories. It converts between row types and ledger records and
//! translates `DatabaseError` into `PortError`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool_from_url, run_migrations, PostgresLedgerStore};
//! use domain_ledger::{LedgerService, LedgerStore};
//! use std::sync::Arc;
//!
//! let pool = create_pool_from_url("postgres://localhost/ledger").await?;
//! run_migrations(&pool).await?;
//!
//! let store: Arc<dyn LedgerStore> = Arc::new(PostgresLedgerStore::new(pool));
//! let service = LedgerService::new(store, BusinessCalendar::default());
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    CashEntryId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable,
    PortError, SalesEntryId,
};
use domain_ledger::{
    Balance, CascadeSummary, CashEntry, Customer, EntryQuery, LedgerStore, SalesEntry,
};

use crate::repositories::{
    BalanceRepository, BalanceRow, CashRepository, CashRow, CustomerRepository, CustomerRow,
    EntryFilter, NameTotal, SalesRepository, SalesRow,
};

const ADAPTER_ID: &str = "postgres-ledger-store";

/// PostgreSQL-backed implementation of the `LedgerStore` port
///
/// Batch inserts and customer cascades each run in a single transaction.
/// Balance deltas are applied with one `UPDATE ... RETURNING` statement, so
/// concurrent deltas on the same customer serialize on the row lock.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    customers: CustomerRepository,
    balances: BalanceRepository,
    sales: SalesRepository,
    cash: CashRepository,
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool.clone()),
            balances: BalanceRepository::new(pool.clone()),
            sales: SalesRepository::new(pool.clone()),
            cash: CashRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns the underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(ADAPTER_ID, latency_ms, format!("Database error: {}", e)),
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, customer, opening_cash), fields(customer = %customer.name))]
    async fn create_customer_account(
        &self,
        customer: &Customer,
        opening_cash: &CashEntry,
    ) -> Result<(), PortError> {
        self.customers
            .open_account(
                *customer.id.as_uuid(),
                &customer.name,
                &customer.number,
                &cash_row(opening_cash),
            )
            .await
            .map_err(PortError::from)
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        let row = self.customers.get_by_id(*id.as_uuid()).await?;
        Ok(row.map(customer_from_row))
    }

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>, PortError> {
        let row = self.customers.get_by_name(name).await?;
        Ok(row.map(customer_from_row))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, PortError> {
        let rows = self.customers.list().await?;
        Ok(rows.into_iter().map(customer_from_row).collect())
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn update_customer(&self, previous_name: &str, customer: &Customer) -> Result<(), PortError> {
        self.customers
            .update(*customer.id.as_uuid(), previous_name, &customer.name, &customer.number)
            .await
            .map_err(PortError::from)
    }

    #[instrument(skip(self))]
    async fn delete_customer(&self, name: &str) -> Result<CascadeSummary, PortError> {
        let counts = self.customers.delete_cascade(name).await?;
        debug!(?counts, "Deleted customer records");
        Ok(CascadeSummary {
            customers: counts.customers,
            sales_entries: counts.sales_entries,
            cash_entries: counts.cash_entries,
            balances: counts.balances,
        })
    }

    async fn get_balance(&self, name: &str) -> Result<Option<Balance>, PortError> {
        let row = self.balances.get(name).await?;
        Ok(row.map(balance_from_row))
    }

    async fn get_balances(&self, names: &[String]) -> Result<Vec<Balance>, PortError> {
        let rows = self.balances.get_many(names).await?;
        Ok(rows.into_iter().map(balance_from_row).collect())
    }

    async fn list_balances(&self) -> Result<Vec<Balance>, PortError> {
        let rows = self.balances.list().await?;
        Ok(rows.into_iter().map(balance_from_row).collect())
    }

    #[instrument(skip(self), fields(delta = %delta))]
    async fn apply_balance_delta(&self, name: &str, delta: Decimal) -> Result<Decimal, PortError> {
        let balance = self.balances.apply_delta(name, delta).await?;
        debug!(balance = %balance, "Applied balance delta");
        Ok(balance)
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn insert_sales(&self, entries: &[SalesEntry]) -> Result<usize, PortError> {
        let rows: Vec<SalesRow> = entries.iter().map(sales_row).collect();
        Ok(self.sales.insert_batch(&rows).await?)
    }

    async fn get_sales(&self, id: SalesEntryId) -> Result<Option<SalesEntry>, PortError> {
        let row = self.sales.get(*id.as_uuid()).await?;
        Ok(row.map(sales_from_row))
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    async fn replace_sales(&self, entry: &SalesEntry) -> Result<SalesEntry, PortError> {
        let previous = self.sales.replace(&sales_row(entry)).await?;
        Ok(sales_from_row(previous))
    }

    #[instrument(skip(self), fields(entry_id = %id))]
    async fn delete_sales(&self, id: SalesEntryId) -> Result<SalesEntry, PortError> {
        let row = self.sales.delete(*id.as_uuid()).await?;
        Ok(sales_from_row(row))
    }

    async fn find_sales(&self, query: &EntryQuery) -> Result<Vec<SalesEntry>, PortError> {
        let rows = self.sales.find(entry_filter(query)).await?;
        Ok(rows.into_iter().map(sales_from_row).collect())
    }

    async fn sum_sales(&self, query: &EntryQuery) -> Result<HashMap<String, Decimal>, PortError> {
        let totals = self.sales.sum_by_name(entry_filter(query)).await?;
        Ok(totals_by_name(totals))
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn insert_cash(&self, entries: &[CashEntry]) -> Result<usize, PortError> {
        let rows: Vec<CashRow> = entries.iter().map(cash_row).collect();
        Ok(self.cash.insert_batch(&rows).await?)
    }

    async fn get_cash(&self, id: CashEntryId) -> Result<Option<CashEntry>, PortError> {
        let row = self.cash.get(*id.as_uuid()).await?;
        Ok(row.map(cash_from_row))
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    async fn replace_cash(&self, entry: &CashEntry) -> Result<CashEntry, PortError> {
        let previous = self.cash.replace(&cash_row(entry)).await?;
        Ok(cash_from_row(previous))
    }

    #[instrument(skip(self), fields(entry_id = %id))]
    async fn delete_cash(&self, id: CashEntryId) -> Result<CashEntry, PortError> {
        let row = self.cash.delete(*id.as_uuid()).await?;
        Ok(cash_from_row(row))
    }

    async fn find_cash(&self, query: &EntryQuery) -> Result<Vec<CashEntry>, PortError> {
        let rows = self.cash.find(entry_filter(query)).await?;
        Ok(rows.into_iter().map(cash_from_row).collect())
    }

    async fn sum_cash(&self, query: &EntryQuery) -> Result<HashMap<String, Decimal>, PortError> {
        let totals = self.cash.sum_by_name(entry_filter(query)).await?;
        Ok(totals_by_name(totals))
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn entry_filter(query: &EntryQuery) -> EntryFilter<'_> {
    EntryFilter {
        names: query.names.as_deref(),
        start: query.window.start,
        end: query.window.end,
    }
}

fn totals_by_name(totals: Vec<NameTotal>) -> HashMap<String, Decimal> {
    totals.into_iter().map(|t| (t.name, t.total)).collect()
}

fn customer_from_row(row: CustomerRow) -> Customer {
    Customer {
        id: CustomerId::from(row.customer_id),
        name: row.name,
        number: row.number,
    }
}

fn balance_from_row(row: BalanceRow) -> Balance {
    Balance::new(row.name, row.balance)
}

fn sales_row(entry: &SalesEntry) -> SalesRow {
    SalesRow {
        entry_id: *entry.id.as_uuid(),
        name: entry.name.clone(),
        item: entry.item.clone(),
        bags: entry.bags,
        weight: entry.weight,
        cooly: entry.cooly,
        price: entry.price,
        amount: entry.amount,
        entry_date: entry.date,
    }
}

fn sales_from_row(row: SalesRow) -> SalesEntry {
    SalesEntry {
        id: SalesEntryId::from(row.entry_id),
        name: row.name,
        item: row.item,
        bags: row.bags,
        weight: row.weight,
        cooly: row.cooly,
        price: row.price,
        amount: row.amount,
        date: row.entry_date,
    }
}

fn cash_row(entry: &CashEntry) -> CashRow {
    CashRow {
        entry_id: *entry.id.as_uuid(),
        name: entry.name.clone(),
        cash_type: entry.cash_type.clone(),
        amount: entry.amount,
        entry_date: entry.date,
    }
}

fn cash_from_row(row: CashRow) -> CashEntry {
    CashEntry {
        id: CashEntryId::from(row.entry_id),
        name: row.name,
        cash_type: row.cash_type,
        amount: row.amount,
        date: row.entry_date,
    }
}
