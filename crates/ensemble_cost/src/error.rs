//! Error types for cost metering.

use thiserror::Error;

/// Result type alias for cost operations.
pub type CostResult<T> = Result<T, CostError>;

/// Errors that can occur during cost operations.
#[derive(Error, Debug)]
pub enum CostError {
    #[error("Invalid price table: {0}")]
    PriceTable(String),

    #[error("Cost ledger is sealed: the run has completed or aborted")]
    Sealed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
