//! TaskCreator port consumed by the automation engine's `auto`/`approval` modes.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::TaskID;

#[async_trait]
pub trait TaskCreator: Send + Sync {
    /// Allocates a fresh `AUTO-NNN` identifier (`NNN` = `max(existing) + 1`,
    /// zero-padded to 3 digits) and creates the task. Allocation must be
    /// serialized so that two concurrent calls never observe the same max.
    async fn create_automation_task(
        &self,
        template: &str,
        trigger_id: uuid::Uuid,
        reason: &str,
    ) -> DomainResult<TaskID>;

    async fn start_automation_task(&self, task_id: &TaskID) -> DomainResult<()>;
}
