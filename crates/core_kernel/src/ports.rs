//! Store port plumbing
//!
//! The ledger services talk to storage through the `LedgerStore` port in
//! `domain_ledger`. Every implementation of that port (the in-memory store
//! and the PostgreSQL store in `infra_db`) reports failures as a
//! `PortError` and answers health checks with a `HealthCheckResult`.
//!
//! ```text
//!   mutation / bills / lifecycle
//!               │
//!         LedgerStore port ── PortError, HealthCheckResult
//!          ▲             ▲
//!     in-memory      PostgreSQL
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a ledger store
///
/// The ledger services map these onto their own error kinds, so stores
/// should pick the variant by what the caller can do about it rather than
/// by what went wrong internally.
#[derive(Debug, Error)]
pub enum PortError {
    /// No record under the given key. Customers and balances are keyed by
    /// name, entries by id.
    #[error("{entity} '{key}' does not exist")]
    NotFound { entity: &'static str, key: String },

    /// The store refused the write as malformed
    #[error("Rejected by store: {0}")]
    Validation(String),

    /// The write would break a uniqueness rule, e.g. a second customer
    /// with an existing name
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached
    #[error("Store unavailable: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Store failure: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Connection failure that keeps the driver error as its source
    pub fn connection_from(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PortError::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Internal failure that keeps the driver error as its source
    pub fn internal_from(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PortError::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict(_))
    }
}

/// Marker for store ports: shareable across tasks for the life of the process
pub trait DomainPort: Send + Sync + 'static {}

/// Health of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of a store health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Which store answered, e.g. `postgres-ledger-store`
    pub adapter_id: String,
    pub status: AdapterHealth,
    /// Round trip of the check
    pub latency_ms: u64,
    /// Failure detail when unhealthy
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(adapter_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Stores that can be checked for liveness
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}
