//! # ensemble_scm
//!
//! Source-control operations client for Ensemble.
//!
//! Applies [`Change`]s to a run's workspace and publishes the result as a
//! pull request, tolerating transient failures:
//!
//! - **write**: file writes/deletions with a mandatory path-escape guard
//! - **commit**: stage-all and commit, with nothing-to-commit reported
//! - **push / open_pull_request**: bounded retry with exponential backoff,
//!   transient-only; pull-request creation is idempotent per branch

pub mod change;
pub mod client;
pub mod error;
pub mod github;
pub mod retry;

// Re-export main types for convenience
pub use change::{resolve_in_workspace, Change, FileOp};
pub use client::{PullRequestResult, ScmClient};
pub use error::{ErrorClass, ScmError, ScmResult};
pub use github::{GithubClient, PullRequest, PullRequestHost, RepoSlug};
pub use retry::RetryPolicy;
