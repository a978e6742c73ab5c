//! Cleanup command - remove workspaces kept by debug runs.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::Settings;

#[derive(Args)]
pub struct CleanupArgs {
    /// List kept workspaces without removing them
    #[arg(long)]
    list: bool,
}

pub async fn execute(args: CleanupArgs) -> Result<()> {
    let settings = Settings::from_env();
    let manager = settings.workspace_manager();

    let roots = manager.kept_roots()?;
    if roots.is_empty() {
        println!("No kept workspaces under {}", manager.parent_dir().display());
        return Ok(());
    }

    for root in &roots {
        if args.list {
            println!("{}", root.display());
        } else {
            std::fs::remove_dir_all(root)?;
            info!("Removed kept workspace {}", root.display());
            println!("🗑️  Removed {}", root.display());
        }
    }

    if !args.list {
        println!("✅ Removed {} workspace(s)", roots.len());
    }
    Ok(())
}
