//! Ledger service facade
//!
//! Bundles the mutation, bill and lifecycle engines over one shared store
//! so callers wire a single value.

use std::sync::Arc;

use core_kernel::{BusinessCalendar, HealthCheckResult};

use crate::bills::BillEngine;
use crate::lifecycle::CustomerLifecycle;
use crate::mutation::BalanceMutationEngine;
use crate::ports::LedgerStore;

/// Entry point to the ledger engines
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    mutations: BalanceMutationEngine,
    bills: BillEngine,
    customers: CustomerLifecycle,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, calendar: BusinessCalendar) -> Self {
        Self {
            mutations: BalanceMutationEngine::new(Arc::clone(&store)),
            bills: BillEngine::new(Arc::clone(&store), calendar),
            customers: CustomerLifecycle::new(Arc::clone(&store)),
            store,
        }
    }

    /// Sales and cash recording
    pub fn mutations(&self) -> &BalanceMutationEngine {
        &self.mutations
    }

    /// Bill reconstruction
    pub fn bills(&self) -> &BillEngine {
        &self.bills
    }

    /// Customer accounts and balance reports
    pub fn customers(&self) -> &CustomerLifecycle {
        &self.customers
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Health of the underlying store
    pub async fn health(&self) -> HealthCheckResult {
        self.store.health_check().await
    }
}
