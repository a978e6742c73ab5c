//! Error types for the core module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Clone failed for {url}: {reason}")]
    CloneFailed { url: String, reason: String },

    #[error("Branch already exists on remote: {0}")]
    BranchExists(String),

    #[error("Workspace root already exists: {0}")]
    WorkspaceExists(PathBuf),

    #[error("Nothing to commit: working tree is clean")]
    NothingToCommit,

    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
