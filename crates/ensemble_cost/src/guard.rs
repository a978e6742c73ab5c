//! Budget enforcement: meter spend per run and enforce a hard ceiling.

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{CostError, CostResult};
use crate::ledger::{CostLedger, CostReport, LedgerEntry};
use crate::pricing::PriceTable;

/// Result of a budget check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetStatus {
    /// Spend is under the ceiling (or no ceiling is configured).
    Ok,
    /// Cumulative spend has reached the ceiling; the run must stop issuing
    /// further model calls. In-flight work completes gracefully.
    Exceeded { cumulative: f64, ceiling: f64 },
}

impl BudgetStatus {
    pub fn is_exceeded(&self) -> bool {
        matches!(self, Self::Exceeded { .. })
    }
}

/// Meters spend for one run against an injected price table.
///
/// The guard owns the run's ledger. Once sealed (run completed or aborted)
/// the ledger is immutable and further records are rejected.
#[derive(Debug)]
pub struct CostGuard {
    price_table: PriceTable,
    ledger: CostLedger,
    dry_run: bool,
    sealed: bool,
}

impl CostGuard {
    /// Create a guard with a price table and an optional budget ceiling.
    pub fn new(price_table: PriceTable, ceiling: Option<f64>) -> Self {
        Self {
            price_table,
            ledger: CostLedger::new(ceiling),
            dry_run: false,
            sealed: false,
        }
    }

    /// Rehearsal mode: the estimation path still runs, but every entry is
    /// recorded at zero cost.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Record one model invocation and return the cumulative total.
    ///
    /// An unrecognized model is priced at the table's default rate with a
    /// warning; a pricing-table miss never fails the run.
    pub fn record(
        &mut self,
        model_id: &str,
        input_units: u64,
        output_units: u64,
    ) -> CostResult<f64> {
        if self.sealed {
            return Err(CostError::Sealed);
        }

        let (price, known) = self.price_table.price_for(model_id);
        if !known {
            warn!(
                "Unknown model '{}', using default rate from price table {}",
                model_id, self.price_table.version
            );
        }

        let cost = if self.dry_run {
            0.0
        } else {
            price.calculate(input_units, output_units)
        };

        let cumulative = self.ledger.append(LedgerEntry {
            timestamp: Utc::now(),
            model: model_id.to_string(),
            input_units,
            output_units,
            price_version: self.price_table.version.clone(),
            cost,
        });

        debug!(
            "Recorded ${:.4} for {} ({} in / {} out), cumulative ${:.4}",
            cost, model_id, input_units, output_units, cumulative
        );

        Ok(cumulative)
    }

    /// Compare cumulative spend against the ceiling.
    ///
    /// Once cumulative cost reaches the ceiling, every subsequent check in
    /// the same run reports `Exceeded`. No ceiling means always `Ok`.
    pub fn check_budget(&self) -> BudgetStatus {
        match self.ledger.ceiling() {
            Some(ceiling) if self.ledger.cumulative() >= ceiling => BudgetStatus::Exceeded {
                cumulative: self.ledger.cumulative(),
                ceiling,
            },
            _ => BudgetStatus::Ok,
        }
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Freeze the ledger and produce the final report.
    ///
    /// Called on every run outcome, so spend is auditable regardless of how
    /// the run ended. Sealing twice returns the same report.
    pub fn seal(&mut self) -> CostReport {
        self.sealed = true;
        CostReport::from_ledger(&self.ledger)
    }
}
