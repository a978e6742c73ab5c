//! Run descriptor: one end-to-end execution of the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Execution mode for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Ship code changes as a pull request.
    Code,
    /// Produce analysis artifacts locally, no pull request.
    Business,
    /// Rehearse the pipeline: no spend, no remote side effects.
    DryRun,
}

impl RunMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Code => "code",
            Self::Business => "business",
            Self::DryRun => "dry-run",
        }
    }

    /// Whether this mode is allowed to touch the remote host.
    pub fn publishes(&self) -> bool {
        matches!(self, Self::Code)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unrecognized mode names are an error, never a default: falling back to
/// `Code` would turn a mistyped rehearsal into real repository mutation.
impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "code" => Ok(Self::Code),
            "business" => Ok(Self::Business),
            "dry-run" | "dryrun" => Ok(Self::DryRun),
            other => Err(format!(
                "unrecognized mode '{}' (expected code, business, or dry-run)",
                other
            )),
        }
    }
}

/// One execution of the idea-to-pull-request pipeline.
///
/// A run owns exactly one workspace and one cost ledger for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique run identifier
    pub id: Uuid,
    /// Target repository URL (token never embedded here)
    pub repo_url: String,
    /// Base branch to branch off and target with the pull request
    pub base_branch: String,
    /// Feature branch, derived deterministically from the run id
    pub feature_branch: String,
    /// Execution mode
    pub mode: RunMode,
    /// Budget ceiling in currency units; `None` means unlimited
    pub budget_ceiling: Option<f64>,
    /// Debug flag: keep the workspace on disk after the run
    pub debug: bool,
    /// When the run was created
    pub created_at: DateTime<Utc>,
}

impl Run {
    /// Create a new run against a repository and base branch.
    pub fn new(repo_url: impl Into<String>, base_branch: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            repo_url: repo_url.into(),
            base_branch: base_branch.into(),
            feature_branch: branch_for_run(&id),
            mode: RunMode::Code,
            budget_ceiling: None,
            debug: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_budget(mut self, ceiling: Option<f64>) -> Self {
        self.budget_ceiling = ceiling;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Short form of the run id used in branch and directory names.
    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }
}

fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Deterministic feature branch name for a run id.
///
/// Collision with an existing remote branch is checked at acquire time,
/// never silently overwritten.
pub fn branch_for_run(id: &Uuid) -> String {
    format!("ensemble/run-{}", short_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let run = Run::new("https://github.com/acme/widgets.git", "main");
        assert_eq!(run.mode, RunMode::Code);
        assert_eq!(run.base_branch, "main");
        assert!(run.budget_ceiling.is_none());
        assert!(!run.debug);
    }

    #[test]
    fn test_branch_is_deterministic_for_id() {
        let run = Run::new("https://github.com/acme/widgets.git", "main");
        assert_eq!(run.feature_branch, branch_for_run(&run.id));
        assert!(run.feature_branch.starts_with("ensemble/run-"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("code".parse::<RunMode>().unwrap(), RunMode::Code);
        assert_eq!("BUSINESS".parse::<RunMode>().unwrap(), RunMode::Business);
        assert_eq!("dry-run".parse::<RunMode>().unwrap(), RunMode::DryRun);
        assert!(!RunMode::DryRun.publishes());
        assert!(RunMode::Code.publishes());
    }

    #[test]
    fn test_unrecognized_mode_is_rejected_not_defaulted() {
        for bad in ["dry_run", "codee", "prod", ""] {
            let err = bad.parse::<RunMode>().unwrap_err();
            assert!(err.contains("unrecognized mode"), "{}", err);
        }
    }
}
