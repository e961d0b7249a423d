//! `FsWorktreeManager`: creates and tears down per-task git worktrees.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskID, Worktree, WorktreeStatus};
use crate::domain::ports::WorktreeManager;

pub struct FsWorktreeManager {
    repo_root: String,
    worktree_dir: String,
}

impl FsWorktreeManager {
    pub fn new(repo_root: impl Into<String>, worktree_dir: impl Into<String>) -> Self {
        Self { repo_root: repo_root.into(), worktree_dir: worktree_dir.into() }
    }
}

#[async_trait]
impl WorktreeManager for FsWorktreeManager {
    async fn create(&self, task_id: &TaskID) -> DomainResult<Worktree> {
        let mut worktree = Worktree::new(task_id.clone(), &self.worktree_dir);

        let status = tokio::process::Command::new("git")
            .args(["worktree", "add", "-b", &worktree.branch, &worktree.path])
            .current_dir(&self.repo_root)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| DomainError::Subprocess(format!("git worktree add: {e}")))?;

        if !status.success() {
            return Err(DomainError::Subprocess(format!(
                "git worktree add failed for {task_id} with status {status}"
            )));
        }

        worktree.status = WorktreeStatus::Active;
        info!(%task_id, path = %worktree.path, "worktree created");
        Ok(worktree)
    }

    async fn cleanup(&self, task_id: &TaskID, completed: bool, failed: bool) -> DomainResult<()> {
        if !completed && !failed {
            return Ok(());
        }

        let path = format!("{}/{}", self.worktree_dir, task_id.as_str());

        // Failed worktrees are kept around for postmortem inspection;
        // only completed ones are torn down automatically.
        if failed {
            warn!(%task_id, %path, "worktree kept for inspection after failure");
            return Ok(());
        }

        let status = tokio::process::Command::new("git")
            .args(["worktree", "remove", "--force", &path])
            .current_dir(&self.repo_root)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| DomainError::Subprocess(format!("git worktree remove: {e}")))?;

        if !status.success() {
            return Err(DomainError::Subprocess(format!(
                "git worktree remove failed for {task_id} with status {status}"
            )));
        }

        info!(%task_id, "worktree removed");
        Ok(())
    }
}
