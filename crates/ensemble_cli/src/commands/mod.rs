//! CLI command definitions.
//!
//! Each subcommand maps to one operation of the execution substrate.

use clap::{Parser, Subcommand};

pub mod apply;
pub mod cleanup;

/// Ensemble - execution substrate for prompt-to-pull-request runs
#[derive(Parser)]
#[command(name = "ensemble")]
#[command(version, about = "Ensemble - execution substrate for prompt-to-pull-request runs")]
#[command(long_about = r#"
Ensemble takes a prepared changeset, applies it inside an ephemeral clone
of the target repository, and publishes the result as a pull request,
metering model spend against a budget ceiling along the way.

COMMANDS:
  apply    → Run a changeset through clone, write, commit, push, pull request
  cleanup  → Remove workspaces kept on disk by debug runs

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Budget ceiling exceeded
  4 - Source-control operation failed
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a changeset to the target repository
    Apply(apply::ApplyArgs),

    /// Remove workspaces kept on disk by debug runs
    Cleanup(cleanup::CleanupArgs),
}
