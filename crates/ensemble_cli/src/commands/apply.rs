//! Apply command - run a changeset through the full pipeline.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::time::Instant;
use tracing::info;

use ensemble_core::{Run, RunMode};
use ensemble_cost::CostGuard;
use ensemble_scm::{GithubClient, RepoSlug, RetryPolicy, ScmClient};

use crate::changeset::ChangeSet;
use crate::config::Settings;
use crate::pipeline::{run_pipeline, Outcome};

#[derive(Args)]
pub struct ApplyArgs {
    /// Path to the JSON changeset to apply
    #[arg(short, long)]
    changes: PathBuf,

    /// Target repository URL (overrides ENSEMBLE_REPO_URL)
    #[arg(long)]
    repo: Option<String>,

    /// Base branch to branch off and target (overrides ENSEMBLE_BASE_BRANCH)
    #[arg(long)]
    base: Option<String>,

    /// Execution mode: code, business, or dry-run
    #[arg(short, long, default_value = "code")]
    mode: RunMode,

    /// Budget ceiling in dollars; unlimited when omitted
    #[arg(short, long)]
    budget: Option<f64>,

    /// Rehearse without spending or touching the remote
    #[arg(long)]
    dry_run: bool,

    /// Keep the workspace on disk after the run
    #[arg(long)]
    debug: bool,
}

pub async fn execute(args: ApplyArgs) -> Result<()> {
    let settings = Settings::from_env();

    let repo_url = args
        .repo
        .or(settings.repo_url.clone())
        .context("No repository given: pass --repo or set ENSEMBLE_REPO_URL")?;
    let base_branch = args.base.unwrap_or_else(|| settings.base_branch.clone());

    let mode = if args.dry_run { RunMode::DryRun } else { args.mode };

    let changeset = ChangeSet::load(&args.changes)?;

    let run = Run::new(&repo_url, &base_branch)
        .with_mode(mode)
        .with_budget(args.budget)
        .with_debug(args.debug);

    info!(
        "Run {} against {} ({} -> {}), mode {}",
        run.short_id(),
        repo_url,
        base_branch,
        run.feature_branch,
        mode
    );

    let price_table = settings.price_table()?;
    let mut guard = CostGuard::new(price_table, args.budget);
    if mode == RunMode::DryRun {
        guard = guard.dry_run();
    }

    // The token is required only when the run publishes; local-only modes
    // work against any clonable URL.
    if mode.publishes() && settings.github_token.is_none() {
        anyhow::bail!("ENSEMBLE_GITHUB_TOKEN is required to push and open pull requests");
    }
    let token = settings.github_token.as_deref().unwrap_or_default();

    let slug = RepoSlug::parse(&repo_url)
        .with_context(|| format!("Cannot derive owner/repo from {}", repo_url))?;
    let host = GithubClient::new(slug, token);

    let deadline = settings
        .run_timeout_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    let mut client = ScmClient::new(host, &base_branch)
        .with_retry(RetryPolicy::new(settings.max_retries));
    if let Some(deadline) = deadline {
        client = client.with_deadline(deadline);
    }

    let manager = settings.workspace_manager();
    let report = run_pipeline(
        &run,
        &manager,
        &client,
        &mut guard,
        &changeset,
        settings.github_token.as_deref(),
        deadline,
    )
    .await;

    println!("{}", report.format_summary());

    match &report.outcome {
        Outcome::Completed => {
            if let Some(pr) = &report.pull_request {
                println!("✅ Pull request opened: {}", pr.url);
            } else {
                println!("✅ Run completed ({} mode, nothing published)", mode);
            }
            Ok(())
        }
        Outcome::NothingToCommit => {
            println!("ℹ️  Working tree was clean, nothing to commit");
            Ok(())
        }
        Outcome::Cancelled { reason } => anyhow::bail!("Run cancelled: {}", reason),
        Outcome::BudgetExceeded { cumulative, ceiling } => anyhow::bail!(
            "Budget ceiling exceeded: ${:.4} of ${:.2} spent",
            cumulative,
            ceiling
        ),
        Outcome::Failed { step, error } => {
            anyhow::bail!("Source-control step '{}' failed: {}", step, error)
        }
    }
}
