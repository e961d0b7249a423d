//! Execution domain model — one record per trigger firing.

use super::ids::TaskID;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Execution {
    pub id: Uuid,
    pub trigger_id: Uuid,
    pub task_id: Option<TaskID>,
    pub triggered_at: DateTime<Utc>,
    pub reason: String,
    pub status: ExecutionStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Execution {
    pub fn new(trigger_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_id,
            task_id: None,
            triggered_at: Utc::now(),
            reason: reason.into(),
            status: ExecutionStatus::Pending,
            completed_at: None,
            error_message: None,
        }
    }

    /// `true` for statuses the `completed_at` should be stamped on — that
    /// is, terminal ones. `Running` is explicitly excluded: see the design
    /// note about `UpdateExecutionStatus` stamping `completed_at` even on
    /// the `Pending -> Running` transition in the source this was modeled
    /// on. That is treated here as a bug and not reproduced.
    pub fn is_terminal(status: ExecutionStatus) -> bool {
        matches!(
            status,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Skipped
        )
    }
}
