//! Ledger domain errors

use chrono::NaiveDate;
use core_kernel::{CashEntryId, CustomerId, PortError, SalesEntryId, TemporalError};
use thiserror::Error;

use crate::amount::AmountError;

/// Broad classes of ledger failures
///
/// `NotFound`, `Validation` and `Conflict` describe a problem with the
/// caller's request. `Inconsistency` and `Internal` are server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Inconsistency,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Inconsistency => "inconsistency",
            ErrorKind::Internal => "internal_error",
        }
    }
}

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A ledger event names a customer without an account
    #[error("Customer with name '{name}' not found at batch index {index}; create a customer account first")]
    CustomerNotFound {
        name: String,
        index: usize,
    },

    /// Customer identity not found
    #[error("Customer not found: {0}")]
    UnknownCustomer(String),

    /// Customer id not found
    #[error("Customer not found: {0}")]
    CustomerIdNotFound(CustomerId),

    /// Sales entry not found
    #[error("Sales entry not found: {0}")]
    SalesEntryNotFound(SalesEntryId),

    /// Cash entry not found
    #[error("Cash entry not found: {0}")]
    CashEntryNotFound(CashEntryId),

    /// A report was requested for a customer without a balance record
    #[error("Customer '{0}' has no account")]
    NoAccount(String),

    /// A batch entry is missing a required field
    #[error("Invalid request body at batch index {index}: missing {field}")]
    MissingField {
        index: usize,
        field: &'static str,
    },

    /// A single-record request is missing a required field
    #[error("Invalid request body: missing {0}")]
    MissingRequestField(&'static str),

    /// A batch request carried no entries
    #[error("Batch must contain at least one entry")]
    EmptyBatch,

    /// A report request carried no date
    #[error("Date required: {0}")]
    DateRequired(&'static str),

    /// A date could not be parsed
    #[error("Malformed date: {0}")]
    MalformedDate(String),

    /// A date range ends before it starts
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Generic validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// Amount derivation failed for a batch entry
    #[error("Amount computation failed at batch index {index}: {source}")]
    AmountCalculation {
        index: usize,
        #[source]
        source: AmountError,
    },

    /// Amount derivation failed for a single record
    #[error("Amount computation failed: {0}")]
    Amount(#[from] AmountError),

    /// A customer with the same name already exists
    #[error("Customer found with existing name '{0}'; choose another name")]
    DuplicateCustomer(String),

    /// Stored ledger data violates an engine invariant
    #[error("Ledger inconsistency: {0}")]
    Inconsistency(String),

    /// Storage port failure
    #[error("Store error: {0}")]
    Store(#[from] PortError),
}

impl LedgerError {
    /// Classifies this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::CustomerNotFound { .. }
            | LedgerError::UnknownCustomer(_)
            | LedgerError::CustomerIdNotFound(_)
            | LedgerError::SalesEntryNotFound(_)
            | LedgerError::CashEntryNotFound(_)
            | LedgerError::NoAccount(_) => ErrorKind::NotFound,
            LedgerError::MissingField { .. }
            | LedgerError::MissingRequestField(_)
            | LedgerError::EmptyBatch
            | LedgerError::DateRequired(_)
            | LedgerError::MalformedDate(_)
            | LedgerError::InvalidRange { .. }
            | LedgerError::Validation(_)
            | LedgerError::AmountCalculation { .. }
            | LedgerError::Amount(_) => ErrorKind::Validation,
            LedgerError::DuplicateCustomer(_) => ErrorKind::Conflict,
            LedgerError::Inconsistency(_) => ErrorKind::Inconsistency,
            LedgerError::Store(port) => match port {
                PortError::NotFound { .. } => ErrorKind::NotFound,
                PortError::Validation(_) => ErrorKind::Validation,
                PortError::Conflict(_) => ErrorKind::Conflict,
                _ => ErrorKind::Internal,
            },
        }
    }

    /// Returns true if the caller's request caused this error
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::Validation | ErrorKind::Conflict
        )
    }

    /// Batch index of the offending entry, when known
    pub fn batch_index(&self) -> Option<usize> {
        match self {
            LedgerError::CustomerNotFound { index, .. }
            | LedgerError::MissingField { index, .. }
            | LedgerError::AmountCalculation { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<TemporalError> for LedgerError {
    fn from(error: TemporalError) -> Self {
        match error {
            TemporalError::MalformedDate(input) => LedgerError::MalformedDate(input),
            TemporalError::InvalidRange { start, end } => LedgerError::InvalidRange { start, end },
            other => LedgerError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_separate_client_and_server_errors() {
        assert!(LedgerError::NoAccount("A".into()).is_client_error());
        assert!(LedgerError::DateRequired("date").is_client_error());
        assert!(LedgerError::DuplicateCustomer("A".into()).is_client_error());
        assert!(!LedgerError::Inconsistency("orphan".into()).is_client_error());
        assert!(!LedgerError::Store(PortError::connection("down")).is_client_error());
    }

    #[test]
    fn test_unknown_customer_and_missing_field_are_distinct() {
        let unknown = LedgerError::CustomerNotFound { name: "X".into(), index: 2 };
        let missing = LedgerError::MissingField { index: 2, field: "Price" };

        assert_eq!(unknown.kind(), ErrorKind::NotFound);
        assert_eq!(missing.kind(), ErrorKind::Validation);
        assert_eq!(unknown.batch_index(), Some(2));
        assert!(missing.to_string().contains("Price"));
    }
}
