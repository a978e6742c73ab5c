//! Error types and transient/permanent classification.
//!
//! The retry policy consults [`ScmError::class`] before every attempt:
//! transient failures (network, 5xx, rate limits) are retried with backoff,
//! permanent ones (auth, validation, other 4xx) are surfaced immediately.
//! Retrying a permanent failure is itself a defect, so `Permanent` is the
//! default classification for anything unrecognized.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for source-control operations.
pub type ScmResult<T> = Result<T, ScmError>;

/// Whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Likely to succeed on retry (network, 5xx, rate limit).
    Transient,
    /// Will not succeed on retry (auth, validation, path safety).
    Permanent,
}

/// Errors that can occur during source-control operations.
#[derive(Error, Debug)]
pub enum ScmError {
    #[error("Path escapes the workspace root: {0}")]
    PathEscape(PathBuf),

    #[error("Write to reserved path rejected: {0}")]
    ReservedPath(PathBuf),

    #[error("Nothing to commit: working tree is clean")]
    NothingToCommit,

    #[error("Authentication rejected by host: {0}")]
    Auth(String),

    #[error("Validation rejected by host: {0}")]
    Validation(String),

    #[error("Rate limited by host")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Host returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("Invalid repository URL: {0}")]
    RepoUrl(String),

    #[error("Run deadline exceeded during {0}")]
    DeadlineExceeded(String),

    #[error("{op} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        op: String,
        attempts: u32,
        #[source]
        source: Box<ScmError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScmError {
    /// Classify this error for the retry policy.
    pub fn class(&self) -> ErrorClass {
        match self {
            ScmError::Network(_) => ErrorClass::Transient,
            ScmError::RateLimited { .. } => ErrorClass::Transient,
            ScmError::Api { status, .. } if *status >= 500 => ErrorClass::Transient,
            ScmError::Git(message) if is_transient_git_failure(message) => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }

    /// Map a core git error into the operations-client taxonomy.
    pub(crate) fn from_core(e: ensemble_core::CoreError) -> Self {
        match e {
            ensemble_core::CoreError::NothingToCommit => ScmError::NothingToCommit,
            other => ScmError::Git(other.to_string()),
        }
    }
}

/// Heuristic classification of git stderr for network-shaped failures.
fn is_transient_git_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    [
        "could not resolve host",
        "couldn't connect to server",
        "connection timed out",
        "operation timed out",
        "connection reset",
        "early eof",
        "the remote end hung up",
        "failed to connect",
        "503",
        "502",
        "500",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}
