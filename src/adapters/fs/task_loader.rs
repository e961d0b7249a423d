//! `FsTaskLoader`: resolves a scheduled task ID into the full `Task` +
//! `Plan` the worker pool needs, reading both from the on-disk task
//! corpus. Generates a fresh plan from the task's weight when none exists
//! on disk yet.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Plan, Task, TaskID, TaskStatus};
use crate::domain::ports::PlanGenerator;
use crate::orchestrator::TaskLoader;

pub struct FsTaskLoader {
    root: PathBuf,
    plan_generator: Arc<dyn PlanGenerator>,
}

impl FsTaskLoader {
    pub fn new(root: impl Into<PathBuf>, plan_generator: Arc<dyn PlanGenerator>) -> Self {
        Self { root: root.into(), plan_generator }
    }

    fn task_dir(&self, task_id: &TaskID) -> PathBuf {
        self.root.join("tasks").join(task_id.as_str())
    }

    /// Scans `root/tasks` for entries not yet in a terminal state, for
    /// startup scheduler seeding.
    pub async fn discover_pending(&self) -> DomainResult<Vec<Task>> {
        let tasks_dir = self.root.join("tasks");
        let mut out = Vec::new();

        let mut entries = match tokio::fs::read_dir(&tasks_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(DomainError::Database(format!("read_dir {}: {e}", tasks_dir.display()))),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::Database(format!("read_dir entry: {e}")))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else { continue };
            let Ok(task_id) = TaskID::parse(&name) else { continue };
            let Ok(task) = self.read_task(&task_id).await else { continue };
            if !matches!(task.status, TaskStatus::Completed | TaskStatus::Failed) {
                out.push(task);
            }
        }
        Ok(out)
    }

    async fn read_task(&self, task_id: &TaskID) -> DomainResult<Task> {
        let path = self.task_dir(task_id).join("task.yaml");
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::Database(format!("read {}: {e}", path.display())))?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    async fn read_plan(&self, task_id: &TaskID, weight: crate::domain::models::Weight) -> DomainResult<Plan> {
        let path = self.task_dir(task_id).join("plan.yaml");
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let plan: Plan = serde_yaml::from_str(&contents)?;
                if plan.phases.is_empty() {
                    Ok(Plan::new(self.plan_generator.generate(weight).await?))
                } else {
                    Ok(plan)
                }
            }
            Err(_) => Ok(Plan::new(self.plan_generator.generate(weight).await?)),
        }
    }
}

#[async_trait]
impl TaskLoader for FsTaskLoader {
    async fn load(&self, id: &TaskID) -> DomainResult<(Task, Plan)> {
        let task = self.read_task(id).await?;
        let plan = self.read_plan(id, task.weight).await?;
        Ok((task, plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Category, Weight};
    use crate::planning::StandardPlanGenerator;

    #[tokio::test]
    async fn generates_plan_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let task_id = TaskID::parse("TASK-001").unwrap();
        let task_dir = dir.path().join("tasks").join("TASK-001");
        tokio::fs::create_dir_all(&task_dir).await.unwrap();
        let task = Task::new(task_id.clone(), "demo", Weight::Medium, Category::Feature);
        tokio::fs::write(task_dir.join("task.yaml"), serde_yaml::to_string(&task).unwrap())
            .await
            .unwrap();

        let loader = FsTaskLoader::new(dir.path(), Arc::new(StandardPlanGenerator));
        let (loaded, plan) = loader.load(&task_id).await.unwrap();
        assert_eq!(loaded.id, task_id);
        assert!(!plan.phases.is_empty());
    }

    #[tokio::test]
    async fn discover_pending_skips_terminal_tasks() {
        let dir = tempfile::tempdir().unwrap();
        for (id, status) in [("TASK-001", TaskStatus::Created), ("TASK-002", TaskStatus::Completed)] {
            let task_dir = dir.path().join("tasks").join(id);
            tokio::fs::create_dir_all(&task_dir).await.unwrap();
            let mut task = Task::new(TaskID::parse(id).unwrap(), id, Weight::Small, Category::Chore);
            task.status = status;
            tokio::fs::write(task_dir.join("task.yaml"), serde_yaml::to_string(&task).unwrap())
                .await
                .unwrap();
        }

        let loader = FsTaskLoader::new(dir.path(), Arc::new(StandardPlanGenerator));
        let pending = loader.discover_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id.as_str(), "TASK-001");
    }
}
