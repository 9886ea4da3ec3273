//! Balance mutation engine
//!
//! Records, updates and deletes ledger entries and keeps each customer's
//! running balance in step with them. Balances only ever move through the
//! store's atomic `apply_balance_delta`:
//!
//! | Operation    | Delta applied       |
//! |--------------|---------------------|
//! | sales insert | `+Σ amount`         |
//! | sales update | `new − old`         |
//! | sales delete | `−amount`           |
//! | cash insert  | `−Σ amount`         |
//! | cash update  | `old − new`         |
//! | cash delete  | `+amount`           |
//!
//! Batches are validated in full before anything is written. Entries are
//! persisted first and deltas applied afterwards; a failure between the two
//! leaves the balance behind the entries and is reported as an
//! inconsistency.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use core_kernel::{CashEntryId, PortError, SalesEntryId};

use crate::balance::{accumulate_deltas, Balance, BalanceDelta};
use crate::cash::{CashEntry, CashUpdate, NewCashEntry};
use crate::error::LedgerError;
use crate::ports::LedgerStore;
use crate::sales::{NewSalesEntry, SalesEntry, SalesUpdate};

/// Result of a batch insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Number of entries persisted
    pub inserted: usize,
    /// Balance of every affected customer after the batch
    pub balances: Vec<Balance>,
}

/// Result of a single-entry update or delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome<T> {
    /// The entry as stored now, or as it was before a delete
    pub entry: T,
    /// Balance of the entry's customer after the change
    pub balance: Balance,
}

/// Applies ledger events and their balance deltas
pub struct BalanceMutationEngine {
    store: Arc<dyn LedgerStore>,
}

impl BalanceMutationEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Sales
    // ========================================================================

    /// Records a batch of sales entries
    ///
    /// # Errors
    ///
    /// - `EmptyBatch` if no entries are given
    /// - `MissingField` for the first entry lacking `Name`, `Item` or `Price`
    /// - `CustomerNotFound` for the first entry naming a customer without
    ///   an account
    pub async fn record_sales(&self, batch: Vec<NewSalesEntry>) -> Result<BatchOutcome, LedgerError> {
        if batch.is_empty() {
            warn!("Rejected empty sales batch");
            return Err(LedgerError::EmptyBatch);
        }

        let now = Utc::now();
        let entries = batch
            .into_iter()
            .enumerate()
            .map(|(index, request)| request.into_entry(index, now))
            .collect::<Result<Vec<SalesEntry>, _>>()
            .map_err(|e| {
                warn!(error = %e, "Rejected sales batch");
                e
            })?;

        self.ensure_accounts(entries.iter().map(|e| e.name.as_str())).await?;
        let deltas = accumulate_deltas(entries.iter().map(|e| (e.name.as_str(), e.amount)))?;

        let inserted = self
            .store
            .insert_sales(&entries)
            .await
            .map_err(|e| closed_account(e, entries.iter().map(|e| e.name.as_str())))?;
        info!(inserted, customers = deltas.len(), "Recorded sales batch");

        let balances = self.apply_deltas(deltas).await?;
        Ok(BatchOutcome { inserted, balances })
    }

    /// Replaces a sales entry and moves the balance by `new − old`
    ///
    /// The entry stays with its customer. The delta goes to the name the
    /// store held at the moment of the replace, so a rename committed in
    /// between is honoured.
    pub async fn update_sales(
        &self,
        id: SalesEntryId,
        update: SalesUpdate,
    ) -> Result<EntryOutcome<SalesEntry>, LedgerError> {
        let stored = self
            .store
            .get_sales(id)
            .await?
            .ok_or(LedgerError::SalesEntryNotFound(id))?;
        let updated = stored.updated_with(&update)?;

        let previous = self
            .store
            .replace_sales(&updated)
            .await
            .map_err(|e| missing_entry(e, LedgerError::SalesEntryNotFound(id)))?;
        let delta = checked_difference(updated.amount, previous.amount, &previous.name)?;
        let entry = SalesEntry {
            name: previous.name,
            ..updated
        };

        let balance = self.apply_delta(&entry.name, delta).await?;
        info!(sales_id = %id, customer = %entry.name, %delta, balance = %balance.balance, "Updated sales entry");
        Ok(EntryOutcome { entry, balance })
    }

    /// Removes a sales entry and moves the balance by `−amount`
    pub async fn delete_sales(&self, id: SalesEntryId) -> Result<EntryOutcome<SalesEntry>, LedgerError> {
        let removed = self
            .store
            .delete_sales(id)
            .await
            .map_err(|e| missing_entry(e, LedgerError::SalesEntryNotFound(id)))?;

        let balance = self.apply_delta(&removed.name, -removed.amount).await?;
        info!(sales_id = %id, customer = %removed.name, amount = %removed.amount, balance = %balance.balance, "Deleted sales entry");
        Ok(EntryOutcome { entry: removed, balance })
    }

    // ========================================================================
    // Cash
    // ========================================================================

    /// Records a batch of cash entries
    ///
    /// # Errors
    ///
    /// - `EmptyBatch` if no entries are given
    /// - `MissingField` for the first entry lacking `Name` or `Amount`
    /// - `CustomerNotFound` for the first entry naming a customer without
    ///   an account
    pub async fn record_cash(&self, batch: Vec<NewCashEntry>) -> Result<BatchOutcome, LedgerError> {
        if batch.is_empty() {
            warn!("Rejected empty cash batch");
            return Err(LedgerError::EmptyBatch);
        }

        let now = Utc::now();
        let entries = batch
            .into_iter()
            .enumerate()
            .map(|(index, request)| request.into_entry(index, now))
            .collect::<Result<Vec<CashEntry>, _>>()
            .map_err(|e| {
                warn!(error = %e, "Rejected cash batch");
                e
            })?;

        self.ensure_accounts(entries.iter().map(|e| e.name.as_str())).await?;
        let deltas = accumulate_deltas(entries.iter().map(|e| (e.name.as_str(), -e.amount)))?;

        let inserted = self
            .store
            .insert_cash(&entries)
            .await
            .map_err(|e| closed_account(e, entries.iter().map(|e| e.name.as_str())))?;
        info!(inserted, customers = deltas.len(), "Recorded cash batch");

        let balances = self.apply_deltas(deltas).await?;
        Ok(BatchOutcome { inserted, balances })
    }

    /// Replaces a cash entry and moves the balance by `old − new`
    pub async fn update_cash(
        &self,
        id: CashEntryId,
        update: CashUpdate,
    ) -> Result<EntryOutcome<CashEntry>, LedgerError> {
        let stored = self
            .store
            .get_cash(id)
            .await?
            .ok_or(LedgerError::CashEntryNotFound(id))?;
        let updated = stored.updated_with(&update)?;

        let previous = self
            .store
            .replace_cash(&updated)
            .await
            .map_err(|e| missing_entry(e, LedgerError::CashEntryNotFound(id)))?;
        let delta = checked_difference(previous.amount, updated.amount, &previous.name)?;
        let entry = CashEntry {
            name: previous.name,
            ..updated
        };

        let balance = self.apply_delta(&entry.name, delta).await?;
        info!(cash_id = %id, customer = %entry.name, %delta, balance = %balance.balance, "Updated cash entry");
        Ok(EntryOutcome { entry, balance })
    }

    /// Removes a cash entry and moves the balance by `+amount`
    pub async fn delete_cash(&self, id: CashEntryId) -> Result<EntryOutcome<CashEntry>, LedgerError> {
        let removed = self
            .store
            .delete_cash(id)
            .await
            .map_err(|e| missing_entry(e, LedgerError::CashEntryNotFound(id)))?;

        let balance = self.apply_delta(&removed.name, removed.amount).await?;
        info!(cash_id = %id, customer = %removed.name, amount = %removed.amount, balance = %balance.balance, "Deleted cash entry");
        Ok(EntryOutcome { entry: removed, balance })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Checks that every named customer has an account
    ///
    /// Reports the first offending entry by batch index.
    async fn ensure_accounts<'a>(&self, names: impl Iterator<Item = &'a str> + Clone) -> Result<(), LedgerError> {
        let mut unique: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for name in names.clone() {
            if seen.insert(name) {
                unique.push(name.to_string());
            }
        }

        let known: HashSet<String> = self
            .store
            .get_balances(&unique)
            .await?
            .into_iter()
            .map(|b| b.name)
            .collect();

        match names.enumerate().find(|(_, name)| !known.contains(*name)) {
            Some((index, name)) => {
                warn!(customer = %name, index, "Rejected batch naming an unknown customer");
                Err(LedgerError::CustomerNotFound {
                    name: name.to_string(),
                    index,
                })
            }
            None => Ok(()),
        }
    }

    async fn apply_deltas(&self, deltas: Vec<BalanceDelta>) -> Result<Vec<Balance>, LedgerError> {
        let mut balances = Vec::with_capacity(deltas.len());
        for BalanceDelta { name, delta } in deltas {
            balances.push(self.apply_delta(&name, delta).await?);
        }
        Ok(balances)
    }

    async fn apply_delta(&self, name: &str, delta: Decimal) -> Result<Balance, LedgerError> {
        match self.store.apply_balance_delta(name, delta).await {
            Ok(balance) => {
                info!(customer = %name, %delta, %balance, "Applied balance delta");
                Ok(Balance::new(name, balance))
            }
            Err(PortError::NotFound { .. }) => {
                error!(customer = %name, %delta, "Ledger entry written for customer without balance record");
                Err(LedgerError::Inconsistency(format!(
                    "Customer '{}' has ledger entries but no balance record",
                    name
                )))
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// An account closed between validation and the write
fn closed_account<'a>(error: PortError, mut names: impl Iterator<Item = &'a str>) -> LedgerError {
    match error {
        PortError::NotFound { key, .. } => match names.position(|name| name == key) {
            Some(index) => {
                warn!(customer = %key, index, "Rejected batch for a customer closed mid-request");
                LedgerError::CustomerNotFound { name: key, index }
            }
            None => PortError::NotFound { entity: "Balance", key }.into(),
        },
        other => other.into(),
    }
}

fn missing_entry(error: PortError, not_found: LedgerError) -> LedgerError {
    if error.is_not_found() {
        not_found
    } else {
        error.into()
    }
}

fn checked_difference(minuend: Decimal, subtrahend: Decimal, name: &str) -> Result<Decimal, LedgerError> {
    minuend
        .checked_sub(subtrahend)
        .ok_or_else(|| crate::amount::AmountError::DeltaOverflow(name.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerStore;
    use crate::cash::CashEntry;
    use crate::customer::NewCustomer;
    use rust_decimal_macros::dec;

    async fn engine_with(names: &[&str]) -> (BalanceMutationEngine, InMemoryLedgerStore) {
        let store = InMemoryLedgerStore::new();
        for name in names {
            let customer = NewCustomer::new(*name, "9000000000").into_customer().unwrap();
            let placeholder = CashEntry::opening_placeholder(*name, Utc::now());
            store.create_customer_account(&customer, &placeholder).await.unwrap();
        }
        (BalanceMutationEngine::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_batch_accumulates_per_customer() {
        let (engine, store) = engine_with(&["A", "B"]).await;

        let outcome = engine
            .record_sales(vec![
                NewSalesEntry::new("A", "Onion", dec!(1)).with_weight(dec!(100)),
                NewSalesEntry::new("B", "Onion", dec!(1)).with_weight(dec!(40)),
                NewSalesEntry::new("A", "Garlic", dec!(1)).with_weight(dec!(20)),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.inserted, 3);
        assert_eq!(
            outcome.balances,
            vec![Balance::new("A", dec!(140)), Balance::new("B", dec!(50))]
        );
        assert_eq!(store.snapshot().await.stored_balance("A"), Some(dec!(140)));
    }

    #[tokio::test]
    async fn test_unknown_customer_rejects_whole_batch() {
        let (engine, store) = engine_with(&["A"]).await;

        let result = engine
            .record_sales(vec![
                NewSalesEntry::new("A", "Onion", dec!(20)),
                NewSalesEntry::new("X", "Onion", dec!(20)),
            ])
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::CustomerNotFound { ref name, index: 1 }) if name == "X"
        ));
        let snapshot = store.snapshot().await;
        assert!(snapshot.sales.is_empty());
        assert_eq!(snapshot.stored_balance("A"), Some(dec!(0)));
    }

    #[tokio::test]
    async fn test_missing_field_is_checked_before_existence() {
        let (engine, _) = engine_with(&[]).await;

        let result = engine
            .record_sales(vec![NewSalesEntry {
                name: Some("X".into()),
                item: Some("Onion".into()),
                ..Default::default()
            }])
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::MissingField { index: 0, field: "Price" })
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let (engine, _) = engine_with(&["A"]).await;
        assert!(matches!(engine.record_cash(vec![]).await, Err(LedgerError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_cash_update_applies_old_minus_new() {
        let (engine, store) = engine_with(&["A"]).await;
        engine
            .record_cash(vec![NewCashEntry::new("A", dec!(300))])
            .await
            .unwrap();
        let id = store.snapshot().await.cash[1].id;

        let outcome = engine.update_cash(id, CashUpdate::new(dec!(200))).await.unwrap();

        assert_eq!(outcome.balance.balance, dec!(-200));
        assert_eq!(outcome.entry.amount, dec!(200));
    }

    #[tokio::test]
    async fn test_delete_of_unknown_entry_is_not_found() {
        let (engine, _) = engine_with(&["A"]).await;
        let id = SalesEntryId::new();

        assert!(matches!(
            engine.delete_sales(id).await,
            Err(LedgerError::SalesEntryNotFound(missing)) if missing == id
        ));
    }
}
