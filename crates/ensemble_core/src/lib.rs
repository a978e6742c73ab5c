//! # ensemble_core
//!
//! Run model and workspace lifecycle for Ensemble.
//!
//! This crate provides the execution substrate's foundation: the run
//! descriptor, git plumbing, and the workspace lifecycle manager that gives
//! each run scoped, exclusive access to an ephemeral clone of the target
//! repository.
//!
//! # Architecture
//!
//! - **Run**: one execution of the prompt-to-pull-request pipeline
//! - **GitOps**: git plumbing via the `git` binary
//! - **WorkspaceManager**: acquire/release of per-run clones with a
//!   guaranteed-cleanup contract

pub mod error;
pub mod git;
pub mod run;
pub mod workspace;

// Re-export main types for convenience
pub use error::{CoreError, CoreResult};
pub use git::{GitCommit, GitOps};
pub use run::{branch_for_run, Run, RunMode};
pub use workspace::{authenticated_url, Workspace, WorkspaceManager};
