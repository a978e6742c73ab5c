//! Git plumbing for workspace and source-control operations.
//!
//! All operations shell out to the `git` binary; errors carry the stderr of
//! the failed command. Push authentication rides on the credential embedded
//! in the origin remote at clone time, so stderr must be treated as
//! sensitive only insofar as git itself redacts URLs (it does).

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};

/// A commit created in a workspace.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GitCommit {
    pub hash: String,
    pub message: String,
}

/// Git operations bound to one repository checkout.
#[derive(Debug, Clone)]
pub struct GitOps {
    repo_path: PathBuf,
}

impl GitOps {
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
        }
    }

    /// Check if git is available on the system.
    pub fn is_git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn run(&self, args: &[&str]) -> CoreResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .map_err(|e| CoreError::Git(format!("Failed to run git {}: {}", args[0], e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Git(format!(
                "git {} failed: {}",
                args[0],
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Clone one branch of a repository into `dest`.
    ///
    /// `display_url` is used in errors and logs instead of `url`, which may
    /// embed a credential.
    pub fn clone_branch(
        url: &str,
        display_url: &str,
        branch: &str,
        dest: &Path,
    ) -> CoreResult<GitOps> {
        info!("Cloning {} (branch {}) into {}", display_url, branch, dest.display());

        let output = Command::new("git")
            .args([
                "clone",
                "--branch",
                branch,
                "--single-branch",
                url,
                &dest.to_string_lossy(),
            ])
            .output()
            .map_err(|e| CoreError::CloneFailed {
                url: display_url.to_string(),
                reason: format!("Failed to run git clone: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::CloneFailed {
                url: display_url.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        Ok(GitOps::new(dest))
    }

    /// Check whether a branch exists on a remote.
    ///
    /// An unreachable or unauthorized remote surfaces as `CloneFailed`, the
    /// setup-error class for this stage.
    pub fn remote_branch_exists(url: &str, display_url: &str, branch: &str) -> CoreResult<bool> {
        let refspec = format!("refs/heads/{}", branch);
        let output = Command::new("git")
            .args(["ls-remote", "--heads", url, &refspec])
            .output()
            .map_err(|e| CoreError::CloneFailed {
                url: display_url.to_string(),
                reason: format!("Failed to run git ls-remote: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::CloneFailed {
                url: display_url.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        Ok(!output.stdout.is_empty())
    }

    /// Create and check out a new local branch.
    pub fn checkout_new_branch(&self, name: &str) -> CoreResult<()> {
        debug!("Checking out new branch {}", name);
        self.run(&["checkout", "-b", name])?;
        Ok(())
    }

    /// Get the current branch name.
    pub fn current_branch(&self) -> CoreResult<String> {
        let branch = self.run(&["branch", "--show-current"])?.trim().to_string();
        if branch.is_empty() {
            return Err(CoreError::Git("No branch found".to_string()));
        }
        Ok(branch)
    }

    /// Whether the working tree has staged, unstaged, or untracked changes.
    pub fn is_dirty(&self) -> CoreResult<bool> {
        let stdout = self.run(&["status", "--porcelain"])?;
        Ok(!stdout.trim().is_empty())
    }

    /// Stage all pending changes, including deletions.
    pub fn add_all(&self) -> CoreResult<()> {
        self.run(&["add", "-A"])?;
        Ok(())
    }

    /// Commit staged changes.
    ///
    /// A clean tree is `NothingToCommit`, a reportable no-op rather than a
    /// generic git failure.
    pub fn commit(&self, message: &str) -> CoreResult<GitCommit> {
        if !self.is_dirty()? {
            return Err(CoreError::NothingToCommit);
        }

        let output = Command::new("git")
            .args(["commit", "-m", message])
            .current_dir(&self.repo_path)
            .output()
            .map_err(|e| CoreError::Git(format!("Failed to commit: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            if stderr.contains("nothing to commit") || stdout.contains("nothing to commit") {
                return Err(CoreError::NothingToCommit);
            }
            return Err(CoreError::Git(format!("git commit failed: {}", stderr.trim())));
        }

        let hash = self.rev_parse_head()?;
        info!("Committed {} ({})", &hash[..hash.len().min(8)], message);

        Ok(GitCommit {
            hash,
            message: message.to_string(),
        })
    }

    /// Get the hash of HEAD.
    pub fn rev_parse_head(&self) -> CoreResult<String> {
        Ok(self.run(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    /// Count commits in a revision range (e.g. `origin/main..HEAD`).
    pub fn rev_list_count(&self, range: &str) -> CoreResult<usize> {
        let stdout = self.run(&["rev-list", "--count", range])?;
        stdout
            .trim()
            .parse()
            .map_err(|e| CoreError::Git(format!("Unparseable rev-list count: {}", e)))
    }

    /// Push a branch to a remote, setting the upstream.
    ///
    /// Never forced: the feature branch is unique per run, so a non-fast-forward
    /// rejection is a real conflict worth surfacing.
    pub fn push(&self, remote: &str, branch: &str) -> CoreResult<()> {
        info!("Pushing {} to {}", branch, remote);
        self.run(&["push", "--set-upstream", remote, branch])?;
        Ok(())
    }

    /// Set a git config value for this repository (used in tests and for
    /// committer identity in fresh clones).
    pub fn set_config(&self, key: &str, value: &str) -> CoreResult<()> {
        self.run(&["config", key, value])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo(dir: &Path) -> GitOps {
        let git = GitOps::new(dir);
        Command::new("git")
            .args(["init", "-b", "main"])
            .current_dir(dir)
            .output()
            .unwrap();
        git.set_config("user.email", "test@example.com").unwrap();
        git.set_config("user.name", "Test").unwrap();
        git
    }

    #[test]
    fn test_git_available() {
        // This will fail if git is not installed, which is expected
        let available = GitOps::is_git_available();
        println!("Git available: {}", available);
    }

    #[test]
    fn test_commit_clean_tree_is_nothing_to_commit() {
        if !GitOps::is_git_available() {
            println!("Git not available, skipping test");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let git = init_repo(temp_dir.path());

        match git.commit("empty") {
            Err(CoreError::NothingToCommit) => {}
            other => panic!("Expected NothingToCommit, got {:?}", other.map(|c| c.hash)),
        }
    }

    #[test]
    fn test_add_all_and_commit() {
        if !GitOps::is_git_available() {
            println!("Git not available, skipping test");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let git = init_repo(temp_dir.path());

        std::fs::write(temp_dir.path().join("hello.txt"), "hi").unwrap();
        assert!(git.is_dirty().unwrap());

        git.add_all().unwrap();
        let commit = git.commit("add hello").unwrap();
        assert_eq!(commit.message, "add hello");
        assert!(!commit.hash.is_empty());
        assert!(!git.is_dirty().unwrap());
    }

    #[test]
    fn test_checkout_new_branch() {
        if !GitOps::is_git_available() {
            println!("Git not available, skipping test");
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let git = init_repo(temp_dir.path());
        std::fs::write(temp_dir.path().join("seed.txt"), "seed").unwrap();
        git.add_all().unwrap();
        git.commit("seed").unwrap();

        git.checkout_new_branch("ensemble/run-deadbeef").unwrap();
        assert_eq!(git.current_branch().unwrap(), "ensemble/run-deadbeef");
    }
}
