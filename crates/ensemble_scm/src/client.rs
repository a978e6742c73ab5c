//! Source-control operations client.
//!
//! Applies changes to a workspace and publishes the result as a pull
//! request. The operation set is closed: write, commit, push, open pull
//! request. Side effects are confined to the workspace tree and the remote
//! branch/pull request.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use ensemble_core::{GitCommit, Workspace};

use crate::change::{resolve_in_workspace, Change, FileOp};
use crate::error::{ScmError, ScmResult};
use crate::github::PullRequestHost;
use crate::retry::RetryPolicy;

/// Outcome of a successful pull-request publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestResult {
    pub url: String,
    pub branch: String,
    pub commit_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Repository-mutating operations for one run, with retry and idempotency
/// guarantees on the network-bound ones.
pub struct ScmClient<H: PullRequestHost> {
    host: H,
    base_branch: String,
    retry: RetryPolicy,
    deadline: Option<Instant>,
}

impl<H: PullRequestHost> ScmClient<H> {
    pub fn new(host: H, base_branch: impl Into<String>) -> Self {
        Self {
            host,
            base_branch: base_branch.into(),
            retry: RetryPolicy::default(),
            deadline: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bound all backoff waits by an overall run deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Apply a change's file operations to the workspace tree.
    ///
    /// Every path is resolved before anything is written: a single escaping
    /// path rejects the whole change and leaves the filesystem untouched.
    /// Operations are applied in order; later writes may depend on earlier
    /// ones.
    pub fn write(&self, workspace: &Workspace, change: &Change) -> ScmResult<()> {
        let resolved: Vec<(PathBuf, &FileOp)> = change
            .ops
            .iter()
            .map(|op| resolve_in_workspace(&workspace.root, op.path()).map(|p| (p, op)))
            .collect::<ScmResult<_>>()?;

        for (path, op) in resolved {
            match op {
                FileOp::Write { content, .. } => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, content)?;
                    debug!("Wrote {}", path.display());
                }
                FileOp::Delete { .. } => match fs::remove_file(&path) {
                    Ok(()) => debug!("Deleted {}", path.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        debug!("Delete of missing {} is a no-op", path.display());
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }
        Ok(())
    }

    /// Stage all pending changes and commit.
    ///
    /// A clean tree is `NothingToCommit`, reportable rather than fatal.
    pub fn commit(&self, workspace: &Workspace, message: &str) -> ScmResult<GitCommit> {
        let git = workspace.git();
        git.add_all().map_err(ScmError::from_core)?;
        git.commit(message).map_err(ScmError::from_core)
    }

    /// Push the workspace's feature branch, retrying transient failures.
    pub async fn push(&self, workspace: &Workspace) -> ScmResult<()> {
        let git = workspace.git();
        let branch = workspace.branch.clone();
        self.retry
            .run("push", self.deadline, || {
                let git = git.clone();
                let branch = branch.clone();
                async move { git.push("origin", &branch).map_err(ScmError::from_core) }
            })
            .await
    }

    /// Open a pull request for the workspace's feature branch.
    ///
    /// Idempotent: an existing open pull request from the same branch is
    /// returned instead of creating a duplicate, so the operation is safe to
    /// re-invoke after a partial failure (push succeeded, creation crashed).
    pub async fn open_pull_request(
        &self,
        workspace: &Workspace,
        title: &str,
        body: &str,
    ) -> ScmResult<PullRequestResult> {
        let branch = workspace.branch.clone();
        let pull = self
            .retry
            .run("open_pull_request", self.deadline, || {
                let branch = branch.clone();
                async move {
                    if let Some(existing) = self.host.find_open(&branch).await? {
                        info!(
                            "Reusing existing open pull request #{} for {}",
                            existing.number, branch
                        );
                        return Ok(existing);
                    }
                    self.host
                        .create_pull(title, body, &branch, &self.base_branch)
                        .await
                }
            })
            .await?;

        // Commit counting is best-effort reporting; a failure degrades to
        // zero but is never silent.
        let commit_count = match workspace
            .git()
            .rev_list_count(&format!("origin/{}..HEAD", self.base_branch))
        {
            Ok(count) => count,
            Err(e) => {
                warn!("Could not count commits ahead of {}: {}", self.base_branch, e);
                0
            }
        };

        info!("Pull request ready: {}", pull.url);

        Ok(PullRequestResult {
            url: pull.url,
            branch: pull.head_branch,
            commit_count,
            created_at: pull.created_at,
        })
    }
}
