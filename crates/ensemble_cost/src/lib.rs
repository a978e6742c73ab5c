//! # ensemble_cost
//!
//! Per-run cost metering and budget enforcement.
//!
//! Every model invocation in a run is routed through a [`CostGuard`], which
//! prices it against an injected [`PriceTable`], appends it to the run's
//! append-only [`CostLedger`], and answers budget checks against the run's
//! ceiling. When the run ends, on any outcome, the guard is sealed and
//! yields a final [`CostReport`] so spend is always auditable.

pub mod error;
pub mod guard;
pub mod ledger;
pub mod pricing;

// Re-export main types for convenience
pub use error::{CostError, CostResult};
pub use guard::{BudgetStatus, CostGuard};
pub use ledger::{CostLedger, CostReport, LedgerEntry};
pub use pricing::{ModelPrice, PriceTable};
