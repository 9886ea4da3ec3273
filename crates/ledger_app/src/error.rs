//! Application error handling
//!
//! `AppError` covers startup failures. `ErrorResponse` is the rendered form
//! of a `LedgerError` for whatever surface the caller exposes: an error code,
//! a message, and whether the caller or the server is at fault.

use domain_ledger::LedgerError;
use infra_db::DatabaseError;
use serde::Serialize;
use thiserror::Error;

/// Startup and wiring errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to initialise tracing: {0}")]
    Telemetry(String),
}

/// Who is responsible for a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Client,
    Server,
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip)]
    pub class: ErrorClass,
}

impl From<&LedgerError> for ErrorResponse {
    fn from(error: &LedgerError) -> Self {
        let class = if error.is_client_error() {
            ErrorClass::Client
        } else {
            ErrorClass::Server
        };

        // server-side details stay in the logs
        let message = match class {
            ErrorClass::Client => error.to_string(),
            ErrorClass::Server => "The ledger could not complete the request".to_string(),
        };

        Self {
            error: error.kind().as_str().to_string(),
            message,
            class,
        }
    }
}

impl From<LedgerError> for ErrorResponse {
    fn from(error: LedgerError) -> Self {
        Self::from(&error)
    }
}
