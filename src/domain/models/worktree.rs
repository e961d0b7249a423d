//! Worktree domain model.
//!
//! An isolated filesystem checkout for one task; created on worker spawn,
//! removed (per policy) on terminal status.

use super::ids::TaskID;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeStatus {
    Creating,
    Active,
    Completed,
    Failed,
    Removed,
}

impl WorktreeStatus {
    pub fn can_cleanup(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct Worktree {
    pub task_id: TaskID,
    pub path: String,
    pub branch: String,
    pub status: WorktreeStatus,
    pub created_at: DateTime<Utc>,
}

impl Worktree {
    pub fn new(task_id: TaskID, base_dir: &str) -> Self {
        let suffix = task_id.as_str().to_string();
        Self {
            path: format!("{base_dir}/{suffix}"),
            branch: format!("taskorc/{suffix}"),
            task_id,
            status: WorktreeStatus::Creating,
            created_at: Utc::now(),
        }
    }
}
