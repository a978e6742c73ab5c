//! Changeset file: the boundary artifact the external orchestration hands
//! to the substrate.
//!
//! A changeset is the JSON serialization of one unit of work: the file
//! operations and commit message the role sequence produced, the pull
//! request title/body, and optionally the model usage to replay into the
//! cost ledger.

use std::path::Path;

use anyhow::{Context, Result};
use ensemble_scm::Change;
use serde::{Deserialize, Serialize};

/// One recorded model invocation to replay into the cost guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub model: String,
    pub input_units: u64,
    pub output_units: u64,
}

/// A prepared unit of work for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Pull request title
    pub title: String,
    /// Pull request body
    #[serde(default)]
    pub body: String,
    /// Commit message and file operations
    #[serde(flatten)]
    pub change: Change,
    /// Model usage to record against the budget before applying
    #[serde(default)]
    pub usage: Vec<UsageRecord>,
}

impl ChangeSet {
    /// Load a changeset from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read changeset {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid changeset {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_changeset_json() {
        let text = r#"{
            "title": "Add widget",
            "body": "Adds the widget module",
            "message": "feat: add widget",
            "ops": [
                {"action": "write", "path": "src/widget.rs", "content": "pub struct Widget;"},
                {"action": "delete", "path": "src/legacy.rs"}
            ],
            "usage": [
                {"model": "gpt-5-mini", "input_units": 1200, "output_units": 400}
            ]
        }"#;

        let changeset: ChangeSet = serde_json::from_str(text).unwrap();
        assert_eq!(changeset.title, "Add widget");
        assert_eq!(changeset.change.message, "feat: add widget");
        assert_eq!(changeset.change.ops.len(), 2);
        assert_eq!(changeset.usage.len(), 1);
    }

    #[test]
    fn test_body_and_usage_are_optional() {
        let text = r#"{"title": "T", "message": "m", "ops": []}"#;
        let changeset: ChangeSet = serde_json::from_str(text).unwrap();
        assert!(changeset.body.is_empty());
        assert!(changeset.usage.is_empty());
    }
}
