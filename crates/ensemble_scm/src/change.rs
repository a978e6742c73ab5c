//! Change model: a unit of work to be committed.
//!
//! Agent-supplied paths are untrusted. Every path is resolved lexically
//! against the workspace root before any filesystem access: absolute paths,
//! traversal above the root, and writes into `.git/` are all rejected.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ScmError, ScmResult};

/// One file operation within a change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FileOp {
    /// Write (or overwrite) a file with new content.
    Write { path: PathBuf, content: String },
    /// Delete a file. Deleting a missing file is a no-op.
    Delete { path: PathBuf },
}

impl FileOp {
    pub fn path(&self) -> &Path {
        match self {
            FileOp::Write { path, .. } => path,
            FileOp::Delete { path } => path,
        }
    }
}

/// A set of file writes/deletions plus a commit message.
///
/// Produced by the external orchestration, consumed by the operations
/// client; not persisted beyond the workspace's git history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub message: String,
    pub ops: Vec<FileOp>,
}

impl Change {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ops: Vec::new(),
        }
    }

    pub fn write(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.ops.push(FileOp::Write {
            path: path.into(),
            content: content.into(),
        });
        self
    }

    pub fn delete(mut self, path: impl Into<PathBuf>) -> Self {
        self.ops.push(FileOp::Delete { path: path.into() });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Resolve an agent-supplied path inside the workspace root.
///
/// Purely lexical: no filesystem access, so the check also covers paths
/// whose parents do not exist yet. `PathEscape` for absolute paths and
/// traversal above the root, `ReservedPath` for anything under `.git`.
pub fn resolve_in_workspace(root: &Path, path: &Path) -> ScmResult<PathBuf> {
    if path.is_absolute() {
        return Err(ScmError::PathEscape(path.to_path_buf()));
    }

    let mut normalized: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if normalized.pop().is_none() {
                    return Err(ScmError::PathEscape(path.to_path_buf()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ScmError::PathEscape(path.to_path_buf()));
            }
        }
    }

    if normalized.is_empty() {
        return Err(ScmError::PathEscape(path.to_path_buf()));
    }
    if normalized[0] == ".git" {
        return Err(ScmError::ReservedPath(path.to_path_buf()));
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(normalized);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/tmp/ws")
    }

    #[test]
    fn test_plain_relative_path_resolves() {
        let resolved = resolve_in_workspace(&root(), Path::new("src/main.rs")).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/ws/src/main.rs"));
    }

    #[test]
    fn test_internal_parent_components_are_normalized() {
        let resolved = resolve_in_workspace(&root(), Path::new("src/../docs/./a.md")).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/ws/docs/a.md"));
    }

    #[test]
    fn test_absolute_path_is_escape() {
        let err = resolve_in_workspace(&root(), Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, ScmError::PathEscape(_)));
    }

    #[test]
    fn test_traversal_above_root_is_escape() {
        for path in ["../outside.txt", "src/../../outside.txt", ".."] {
            let err = resolve_in_workspace(&root(), Path::new(path)).unwrap_err();
            assert!(matches!(err, ScmError::PathEscape(_)), "path: {}", path);
        }
    }

    #[test]
    fn test_git_dir_is_reserved() {
        let err = resolve_in_workspace(&root(), Path::new(".git/config")).unwrap_err();
        assert!(matches!(err, ScmError::ReservedPath(_)));
    }

    #[test]
    fn test_change_builder_round_trips_as_json() {
        let change = Change::new("feat: add widget")
            .write("src/widget.rs", "pub struct Widget;")
            .delete("src/legacy.rs");

        let json = serde_json::to_string(&change).unwrap();
        let parsed: Change = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, change);
        assert_eq!(parsed.ops.len(), 2);
    }
}
