//! Environment-driven settings for the CLI.
//!
//! The credential and target repository arrive out-of-band via environment
//! variables; flags only set per-run attributes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ensemble_core::WorkspaceManager;
use ensemble_cost::PriceTable;

/// Settings resolved from the environment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Host token for clone, push, and pull-request creation
    pub github_token: Option<String>,
    /// Default target repository URL
    pub repo_url: Option<String>,
    /// Default base branch
    pub base_branch: String,
    /// Maximum attempts for network-bound operations
    pub max_retries: u32,
    /// Optional TOML price table path; builtin prices when unset
    pub price_table_path: Option<PathBuf>,
    /// Parent directory for run workspaces; system temp dir when unset
    pub workspace_dir: Option<PathBuf>,
    /// Overall run timeout in seconds; unbounded when unset
    pub run_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from `ENSEMBLE_*` environment variables.
    pub fn from_env() -> Self {
        let mut settings = Self {
            base_branch: "main".to_string(),
            max_retries: 3,
            ..Default::default()
        };

        settings.github_token = std::env::var("ENSEMBLE_GITHUB_TOKEN").ok();
        settings.repo_url = std::env::var("ENSEMBLE_REPO_URL").ok();
        if let Ok(branch) = std::env::var("ENSEMBLE_BASE_BRANCH") {
            if !branch.trim().is_empty() {
                settings.base_branch = branch;
            }
        }
        if let Ok(retries) = std::env::var("ENSEMBLE_MAX_RETRIES") {
            if let Ok(value) = retries.parse::<u32>() {
                settings.max_retries = value.max(1);
            }
        }
        settings.price_table_path = std::env::var("ENSEMBLE_PRICE_TABLE").ok().map(PathBuf::from);
        settings.workspace_dir = std::env::var("ENSEMBLE_WORKSPACE_DIR").ok().map(PathBuf::from);
        if let Ok(timeout) = std::env::var("ENSEMBLE_RUN_TIMEOUT_SECS") {
            settings.run_timeout_secs = timeout.parse().ok();
        }

        settings
    }

    /// Load the price table from the configured path, or builtin defaults.
    pub fn price_table(&self) -> Result<PriceTable> {
        match &self.price_table_path {
            Some(path) => PriceTable::load(path)
                .with_context(|| format!("Failed to load price table from {}", path.display())),
            None => Ok(PriceTable::builtin()),
        }
    }

    /// Workspace manager rooted at the configured parent directory.
    pub fn workspace_manager(&self) -> WorkspaceManager {
        match &self.workspace_dir {
            Some(dir) => WorkspaceManager::new(dir.clone()),
            None => WorkspaceManager::default(),
        }
    }
}
