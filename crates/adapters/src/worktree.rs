// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worktree Manager (§4.5.5): optional per-claim filesystem isolation on
//! a dedicated git branch. Path safety (§9): reject paths that resolve
//! outside the configured worktrees root, and branch names beginning with
//! `-` or containing shell metacharacters.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::error::AdapterError;

const SHELL_METACHARACTERS: &[char] =
    &[';', '&', '|', '`', '$', '(', ')', '<', '>', '\n', '"', '\'', '\\', '*', '?', '[', ']', '{', '}', '~', '#', '!', ' '];

/// An isolated copy of the source tree on a dedicated branch (Glossary:
/// "Worktree"), within which a single task executes.
#[derive(Debug, Clone)]
pub struct Worktree {
    pub path: PathBuf,
    pub branch: String,
}

/// Acquires and releases per-task worktrees. Wired optionally into the
/// Agent Loop (§4.5.5); when absent, tasks run directly in the project root.
#[async_trait]
pub trait WorktreeManager: Send + Sync + 'static {
    async fn acquire(&self, task_id: &str) -> Result<Worktree, AdapterError>;

    /// Release a previously acquired worktree. A release failure is logged,
    /// never propagated (§4.5.5) — implementations should swallow their own
    /// cleanup errors rather than return them.
    async fn release(&self, worktree: Worktree) -> Result<(), AdapterError>;
}

/// Reject branch names that could be interpreted as a CLI flag or that
/// contain shell metacharacters an injected task ID might carry.
pub fn validate_branch_name(branch: &str) -> Result<(), AdapterError> {
    if branch.is_empty() || branch.starts_with('-') {
        return Err(AdapterError::UnsafeBranch(branch.to_string()));
    }
    if branch.chars().any(|c| SHELL_METACHARACTERS.contains(&c)) {
        return Err(AdapterError::UnsafeBranch(branch.to_string()));
    }
    Ok(())
}

/// Reject task IDs that could traverse out of the worktrees root when used
/// as a path component (e.g. `../../etc`, an embedded path separator).
fn validate_task_id(task_id: &str) -> Result<(), AdapterError> {
    if task_id.is_empty() || task_id.contains('/') || task_id.contains('\\') || task_id.contains("..") {
        return Err(AdapterError::PathEscape(task_id.to_string()));
    }
    Ok(())
}

/// Confirm `path`'s resolved parent still lives under `root` once created.
fn validate_within_root(root: &Path, path: &Path) -> Result<(), AdapterError> {
    let root = root
        .canonicalize()
        .map_err(|e| AdapterError::PathEscape(format!("{}: {e}", root.display())))?;
    let parent = path.parent().unwrap_or(path);
    let resolved = parent
        .canonicalize()
        .map_err(|e| AdapterError::PathEscape(format!("{}: {e}", parent.display())))?;
    if !resolved.starts_with(&root) {
        return Err(AdapterError::PathEscape(path.display().to_string()));
    }
    Ok(())
}

/// Git-backed worktree manager: `git worktree add -b <branch> <path> HEAD`
/// under `repo_root`, with worktrees created under `worktrees_root`.
pub struct GitWorktreeManager {
    repo_root: PathBuf,
    worktrees_root: PathBuf,
}

impl GitWorktreeManager {
    pub fn new(repo_root: impl Into<PathBuf>, worktrees_root: impl Into<PathBuf>) -> Self {
        Self { repo_root: repo_root.into(), worktrees_root: worktrees_root.into() }
    }
}

#[async_trait]
impl WorktreeManager for GitWorktreeManager {
    async fn acquire(&self, task_id: &str) -> Result<Worktree, AdapterError> {
        validate_task_id(task_id)?;
        let branch = format!("ob/{task_id}");
        validate_branch_name(&branch)?;

        tokio::fs::create_dir_all(&self.worktrees_root).await?;
        let path = self.worktrees_root.join(task_id);
        validate_within_root(&self.worktrees_root, &path)?;

        let output = Command::new("git")
            .args(["-C", &self.repo_root.display().to_string(), "worktree", "add", "-b", &branch])
            .arg(&path)
            .arg("HEAD")
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .output()
            .await
            .map_err(|e| AdapterError::GitFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdapterError::GitFailed(stderr.trim().to_string()));
        }

        Ok(Worktree { path, branch })
    }

    async fn release(&self, worktree: Worktree) -> Result<(), AdapterError> {
        let remove = Command::new("git")
            .args(["-C", &self.repo_root.display().to_string(), "worktree", "remove", "--force"])
            .arg(&worktree.path)
            .output()
            .await;
        match remove {
            Ok(output) if !output.status.success() => {
                tracing::warn!(
                    branch = %worktree.branch,
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "git worktree remove failed (best-effort)"
                );
            }
            Err(e) => tracing::warn!(branch = %worktree.branch, error = %e, "git worktree remove failed (best-effort)"),
            Ok(_) => {}
        }

        let delete_branch = Command::new("git")
            .args(["-C", &self.repo_root.display().to_string(), "branch", "-D", &worktree.branch])
            .output()
            .await;
        if let Err(e) = delete_branch {
            tracing::warn!(branch = %worktree.branch, error = %e, "git branch delete failed (best-effort)");
        }

        if worktree.path.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&worktree.path).await {
                tracing::warn!(path = %worktree.path.display(), error = %e, "worktree directory cleanup failed (best-effort)");
            }
        }

        Ok(())
    }
}

#[cfg(feature = "test-support")]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    /// In-memory worktree manager for `ob-engine` tests: hands out a
    /// deterministic path under a tempdir without shelling out to git.
    pub struct FakeWorktreeManager {
        root: PathBuf,
        released: Mutex<Vec<String>>,
    }

    impl FakeWorktreeManager {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into(), released: Mutex::new(Vec::new()) }
        }

        pub fn released_branches(&self) -> Vec<String> {
            self.released.lock().clone()
        }
    }

    #[async_trait]
    impl WorktreeManager for FakeWorktreeManager {
        async fn acquire(&self, task_id: &str) -> Result<Worktree, AdapterError> {
            validate_task_id(task_id)?;
            let branch = format!("ob/{task_id}");
            validate_branch_name(&branch)?;
            let path = self.root.join(task_id);
            tokio::fs::create_dir_all(&path).await?;
            Ok(Worktree { path, branch })
        }

        async fn release(&self, worktree: Worktree) -> Result<(), AdapterError> {
            self.released.lock().push(worktree.branch);
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
