//! `FsTaskCreator`: allocates `AUTO-NNN` task identifiers and materializes
//! the synthetic task on disk for the automation engine's `auto`/`approval`
//! modes.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::task::{Category, TaskPriority, TaskQueue, TaskStatus, Weight};
use crate::domain::models::{Plan, Task, TaskID};
use crate::domain::ports::TaskCreator;

pub struct FsTaskCreator {
    root: PathBuf,
    /// Serializes `AUTO-NNN` allocation so two concurrent callers never
    /// observe the same max suffix.
    allocation_lock: Mutex<()>,
}

impl FsTaskCreator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), allocation_lock: Mutex::new(()) }
    }

    async fn next_auto_id(&self) -> DomainResult<TaskID> {
        let tasks_dir = self.root.join("tasks");
        let mut max_suffix: u32 = 0;

        if tasks_dir.exists() {
            let mut entries = tokio::fs::read_dir(&tasks_dir)
                .await
                .map_err(|e| DomainError::Database(format!("read_dir tasks: {e}")))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| DomainError::Database(format!("read_dir entry: {e}")))?
            {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if let Some(suffix) = name.strip_prefix("AUTO-") {
                    if let Ok(n) = suffix.parse::<u32>() {
                        max_suffix = max_suffix.max(n);
                    }
                }
            }
        }

        TaskID::parse(format!("AUTO-{:03}", max_suffix + 1))
    }
}

#[async_trait]
impl TaskCreator for FsTaskCreator {
    async fn create_automation_task(
        &self,
        template: &str,
        trigger_id: Uuid,
        reason: &str,
    ) -> DomainResult<TaskID> {
        let _guard = self.allocation_lock.lock().await;
        let task_id = self.next_auto_id().await?;

        let mut task = Task::new(task_id.clone(), template, Weight::Medium, Category::Chore);
        task.description = format!("Automated by trigger {trigger_id}: {reason}");
        task.priority = TaskPriority::Normal;
        task.queue = TaskQueue::Active;

        let dir = self.root.join("tasks").join(task_id.as_str());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Database(format!("create_dir_all {}: {e}", dir.display())))?;

        let task_yaml = serde_yaml::to_string(&task)?;
        tokio::fs::write(dir.join("task.yaml"), task_yaml)
            .await
            .map_err(|e| DomainError::Database(format!("write task.yaml: {e}")))?;

        let plan_yaml = serde_yaml::to_string(&Plan::default())?;
        tokio::fs::write(dir.join("plan.yaml"), plan_yaml)
            .await
            .map_err(|e| DomainError::Database(format!("write plan.yaml: {e}")))?;

        let state_yaml = serde_yaml::to_string(&serde_yaml::Value::Mapping({
            let mut m = serde_yaml::Mapping::new();
            m.insert("status".into(), serde_yaml::to_value(TaskStatus::Created)?);
            m
        }))?;
        tokio::fs::write(dir.join("state.yaml"), state_yaml)
            .await
            .map_err(|e| DomainError::Database(format!("write state.yaml: {e}")))?;

        Ok(task_id)
    }

    async fn start_automation_task(&self, task_id: &TaskID) -> DomainResult<()> {
        let state_path = self.root.join("tasks").join(task_id.as_str()).join("state.yaml");
        let contents = tokio::fs::read_to_string(&state_path)
            .await
            .map_err(|e| DomainError::Database(format!("read state.yaml: {e}")))?;
        let mut value: serde_yaml::Value =
            serde_yaml::from_str(&contents).unwrap_or(serde_yaml::Value::Mapping(Default::default()));
        if let serde_yaml::Value::Mapping(map) = &mut value {
            map.insert("status".into(), serde_yaml::to_value(TaskStatus::Running)?);
        }
        let yaml = serde_yaml::to_string(&value)?;
        tokio::fs::write(&state_path, yaml)
            .await
            .map_err(|e| DomainError::Database(format!("write state.yaml: {e}")))?;
        Ok(())
    }
}
