//! Append-only record of estimated spend for one run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// When the invocation was recorded
    pub timestamp: DateTime<Utc>,
    /// Model identifier as supplied by the caller
    pub model: String,
    /// Input unit count
    pub input_units: u64,
    /// Output unit count
    pub output_units: u64,
    /// Version of the price table that priced this entry
    pub price_version: String,
    /// Computed cost for this invocation
    pub cost: f64,
}

/// The ordered spend record for a run.
///
/// Cumulative cost always equals the sum of the entries and is monotonically
/// non-decreasing; entries are never removed or rewritten.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostLedger {
    entries: Vec<LedgerEntry>,
    cumulative: f64,
    ceiling: Option<f64>,
}

impl CostLedger {
    pub fn new(ceiling: Option<f64>) -> Self {
        Self {
            entries: Vec::new(),
            cumulative: 0.0,
            ceiling,
        }
    }

    /// Append an entry and return the new cumulative total.
    pub(crate) fn append(&mut self, entry: LedgerEntry) -> f64 {
        self.cumulative += entry.cost;
        self.entries.push(entry);
        self.cumulative
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn cumulative(&self) -> f64 {
        self.cumulative
    }

    pub fn ceiling(&self) -> Option<f64> {
        self.ceiling
    }

    pub fn request_count(&self) -> usize {
        self.entries.len()
    }

    /// Budget remaining under the ceiling; `None` when unlimited.
    pub fn remaining(&self) -> Option<f64> {
        self.ceiling.map(|c| c - self.cumulative)
    }
}

/// Final, immutable spend report for a run.
///
/// Produced when the ledger is sealed and always reported, regardless of
/// whether the run completed, failed, or was aborted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostReport {
    pub total_cost: f64,
    pub request_count: usize,
    pub average_cost_per_request: f64,
    pub budget_ceiling: Option<f64>,
    pub budget_remaining: Option<f64>,
    pub entries: Vec<LedgerEntry>,
}

impl CostReport {
    pub(crate) fn from_ledger(ledger: &CostLedger) -> Self {
        let count = ledger.request_count();
        let average = if count > 0 {
            ledger.cumulative() / count as f64
        } else {
            0.0
        };
        Self {
            total_cost: ledger.cumulative(),
            request_count: count,
            average_cost_per_request: average,
            budget_ceiling: ledger.ceiling(),
            budget_remaining: ledger.remaining(),
            entries: ledger.entries().to_vec(),
        }
    }

    /// Human-readable summary for run output.
    pub fn format_summary(&self) -> String {
        let mut lines = vec![
            "Cost summary".to_string(),
            format!("  Total cost:  ${:.4}", self.total_cost),
            format!("  Requests:    {}", self.request_count),
            format!("  Avg/request: ${:.4}", self.average_cost_per_request),
        ];
        if let Some(ceiling) = self.budget_ceiling {
            lines.push(format!("  Budget:      ${:.2}", ceiling));
            lines.push(format!(
                "  Remaining:   ${:.4}",
                self.budget_remaining.unwrap_or(0.0)
            ));
        }
        lines.join("\n")
    }
}
