//! TaskStore port — persists the plan/state side of a task as the Worker
//! advances it. Distinct from `Database`: this crosses into the external,
//! on-disk task corpus the Watcher also observes (`tasks/<id>/{plan.yaml,
//! state.yaml}`), not the engine's own sqlite tables.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Plan, TaskID, TaskStatus};

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn save_plan(&self, task_id: &TaskID, plan: &Plan) -> DomainResult<()>;
    async fn save_task_status(&self, task_id: &TaskID, status: TaskStatus) -> DomainResult<()>;
}
