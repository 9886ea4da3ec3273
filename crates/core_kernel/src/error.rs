//! Kernel errors

use thiserror::Error;
use crate::temporal::TemporalError;

/// Errors raised while setting up the business calendar
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Temporal(#[from] TemporalError),

    /// Not an IANA timezone name
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),
}
