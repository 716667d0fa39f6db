//! Error types for the annuity system
//!
//! The valuation core is total and never returns these. They appear only at
//! the boundaries: parameter validation, table loading, history storage and
//! export.

use thiserror::Error;

/// Result alias used by the I/O and validation boundaries
pub type Result<T, E = AnnuityError> = std::result::Result<T, E>;

/// Errors raised outside the valuation core
#[derive(Error, Debug)]
pub enum AnnuityError {
    /// A parameter is outside the range accepted by the form layer
    #[error("Invalid parameter {field}: {value} - {reason}")]
    InvalidParameter {
        field: &'static str,
        value: f64,
        reason: String,
    },

    /// A mortality table could not be built from its source data
    #[error("Invalid mortality table {table}: {reason}")]
    InvalidTable { table: String, reason: String },

    /// History lookup for an id that is not stored
    #[error("History entry not found: {0}")]
    EntryNotFound(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnnuityError {
    pub(crate) fn invalid_table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        AnnuityError::InvalidTable {
            table: table.into(),
            reason: reason.into(),
        }
    }
}
