//! Pipeline driver: the single owning call frame for a run.
//!
//! Owns the acquire/release pairing around the step sequence, so the
//! workspace is released exactly once on every exit path: success,
//! failure, nothing-to-commit, and budget abort alike. The cost guard is
//! sealed on every outcome, so the final report always carries the ledger.

use std::path::PathBuf;

use ensemble_core::{Run, RunMode, Workspace, WorkspaceManager};
use ensemble_cost::{BudgetStatus, CostGuard, CostReport};
use ensemble_scm::{
    resolve_in_workspace, PullRequestHost, PullRequestResult, ScmClient, ScmError,
};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::changeset::ChangeSet;

/// How a run ended.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    /// All applicable steps completed.
    Completed,
    /// The tree was clean at commit time; a reported no-op, not an error.
    NothingToCommit,
    /// The budget ceiling was reached; a controlled stop, not a crash.
    BudgetExceeded { cumulative: f64, ceiling: f64 },
    /// The run was interrupted or hit its deadline between steps.
    Cancelled { reason: String },
    /// A step failed fatally.
    Failed { step: String, error: String },
}

/// Final report for a run, produced on every outcome.
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub completed_steps: Vec<String>,
    pub outcome: Outcome,
    pub pull_request: Option<PullRequestResult>,
    /// Path of the debug-kept workspace, if any
    pub kept_workspace: Option<PathBuf>,
    pub cost: CostReport,
}

impl PipelineReport {
    /// Human-readable run summary.
    pub fn format_summary(&self) -> String {
        let mut lines = vec![
            format!("Run {} ({})", self.run_id, self.mode),
            format!("  Steps: {}", self.completed_steps.join(" -> ")),
        ];
        match &self.outcome {
            Outcome::Completed => lines.push("  Outcome: completed".to_string()),
            Outcome::NothingToCommit => {
                lines.push("  Outcome: nothing to commit (no-op)".to_string())
            }
            Outcome::BudgetExceeded { cumulative, ceiling } => lines.push(format!(
                "  Outcome: budget exceeded (${:.4} of ${:.2})",
                cumulative, ceiling
            )),
            Outcome::Cancelled { reason } => {
                lines.push(format!("  Outcome: cancelled ({})", reason))
            }
            Outcome::Failed { step, error } => {
                lines.push(format!("  Outcome: failed at {}: {}", step, error))
            }
        }
        if let Some(pr) = &self.pull_request {
            lines.push(format!("  Pull request: {} ({} commits)", pr.url, pr.commit_count));
        }
        if let Some(path) = &self.kept_workspace {
            lines.push(format!("  Workspace kept at: {}", path.display()));
        }
        lines.push(self.cost.format_summary());
        lines.join("\n")
    }
}

enum StepOutcome {
    Completed(Option<PullRequestResult>),
    NothingToCommit,
    BudgetExceeded { cumulative: f64, ceiling: f64 },
    Cancelled { reason: String },
}

/// Execute one run end to end.
///
/// Never panics and never leaks the workspace: every return path goes
/// through release and guard sealing. A user interrupt or an expired
/// `deadline` cancels between steps and takes the same release path.
pub async fn run_pipeline<H: PullRequestHost>(
    run: &Run,
    manager: &WorkspaceManager,
    client: &ScmClient<H>,
    guard: &mut CostGuard,
    changeset: &ChangeSet,
    token: Option<&str>,
    deadline: Option<Instant>,
) -> PipelineReport {
    let mut steps: Vec<String> = Vec::new();

    let mut workspace = match manager.acquire(run, token) {
        Ok(workspace) => workspace,
        Err(e) => {
            // Setup errors abort before any mutation; no workspace exists.
            return PipelineReport {
                run_id: run.id,
                mode: run.mode,
                completed_steps: steps,
                outcome: Outcome::Failed {
                    step: "acquire".to_string(),
                    error: e.to_string(),
                },
                pull_request: None,
                kept_workspace: None,
                cost: guard.seal(),
            };
        }
    };
    steps.push("acquire".to_string());

    let result = tokio::select! {
        result = execute_steps(run, client, guard, changeset, &workspace, &mut steps, deadline) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, releasing workspace");
            Ok(StepOutcome::Cancelled { reason: "interrupted".to_string() })
        }
    };

    if run.debug {
        manager.log_contents(&workspace);
    }
    let kept_workspace = match manager.release(&mut workspace, run.debug) {
        Ok(kept) => kept,
        Err(e) => {
            warn!("Workspace release failed: {}", e);
            None
        }
    };
    steps.push("release".to_string());

    let (outcome, pull_request) = match result {
        Ok(StepOutcome::Completed(pr)) => (Outcome::Completed, pr),
        Ok(StepOutcome::NothingToCommit) => (Outcome::NothingToCommit, None),
        Ok(StepOutcome::BudgetExceeded { cumulative, ceiling }) => {
            (Outcome::BudgetExceeded { cumulative, ceiling }, None)
        }
        Ok(StepOutcome::Cancelled { reason }) => (Outcome::Cancelled { reason }, None),
        Err((step, error)) => (Outcome::Failed { step, error }, None),
    };

    PipelineReport {
        run_id: run.id,
        mode: run.mode,
        completed_steps: steps,
        outcome,
        pull_request,
        kept_workspace,
        cost: guard.seal(),
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

async fn execute_steps<H: PullRequestHost>(
    run: &Run,
    client: &ScmClient<H>,
    guard: &mut CostGuard,
    changeset: &ChangeSet,
    workspace: &Workspace,
    steps: &mut Vec<String>,
    deadline: Option<Instant>,
) -> Result<StepOutcome, (String, String)> {
    // The deadline is checked at every step boundary: a run that is out of
    // time stops before starting the next step, then releases normally.
    if deadline_passed(deadline) {
        return Ok(StepOutcome::Cancelled { reason: "run deadline exceeded".to_string() });
    }
    // Replay model usage into the ledger first; the budget gate sits
    // between entries, so once the ceiling is hit no paid or mutating step
    // starts. Entries already recorded stay in the ledger.
    for usage in &changeset.usage {
        guard
            .record(&usage.model, usage.input_units, usage.output_units)
            .map_err(|e| ("record".to_string(), e.to_string()))?;
        if let BudgetStatus::Exceeded { cumulative, ceiling } = guard.check_budget() {
            info!(
                "Budget ceiling reached (${:.4} of ${:.2}), stopping before mutation",
                cumulative, ceiling
            );
            return Ok(StepOutcome::BudgetExceeded { cumulative, ceiling });
        }
    }
    if !changeset.usage.is_empty() {
        steps.push("record-usage".to_string());
    }

    if run.mode == RunMode::DryRun {
        // Rehearsal: validate every path, touch nothing.
        for op in &changeset.change.ops {
            resolve_in_workspace(&workspace.root, op.path())
                .map_err(|e| ("validate".to_string(), e.to_string()))?;
        }
        steps.push("validate".to_string());
        return Ok(StepOutcome::Completed(None));
    }

    if deadline_passed(deadline) {
        return Ok(StepOutcome::Cancelled { reason: "run deadline exceeded".to_string() });
    }
    client
        .write(workspace, &changeset.change)
        .map_err(|e| ("write".to_string(), e.to_string()))?;
    steps.push("write".to_string());

    match client.commit(workspace, &changeset.change.message) {
        Ok(commit) => {
            info!("Created commit {}", commit.hash);
            steps.push("commit".to_string());
        }
        Err(ScmError::NothingToCommit) => return Ok(StepOutcome::NothingToCommit),
        Err(e) => return Err(("commit".to_string(), e.to_string())),
    }

    if !run.mode.publishes() {
        // Business mode stays local: committed artifacts, no publication.
        return Ok(StepOutcome::Completed(None));
    }

    if deadline_passed(deadline) {
        return Ok(StepOutcome::Cancelled { reason: "run deadline exceeded".to_string() });
    }
    client
        .push(workspace)
        .await
        .map_err(|e| ("push".to_string(), e.to_string()))?;
    steps.push("push".to_string());

    let pull_request = client
        .open_pull_request(workspace, &changeset.title, &changeset.body)
        .await
        .map_err(|e| ("open-pull-request".to_string(), e.to_string()))?;
    steps.push("open-pull-request".to_string());

    Ok(StepOutcome::Completed(Some(pull_request)))
}
