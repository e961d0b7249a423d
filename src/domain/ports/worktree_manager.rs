//! WorktreeManager port — the external git wrapper the worker pool
//! delegates worktree creation and cleanup to.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{TaskID, Worktree};

#[async_trait]
pub trait WorktreeManager: Send + Sync {
    async fn create(&self, task_id: &TaskID) -> DomainResult<Worktree>;

    /// Governed by config: callers pass whether the task completed or
    /// failed so implementations can apply a merge-on-complete /
    /// keep-on-failure policy.
    async fn cleanup(&self, task_id: &TaskID, completed: bool, failed: bool) -> DomainResult<()>;
}
