//! `FsTaskStore`: persists plan/state into the on-disk task corpus the
//! Watcher also observes (`tasks/<id>/{plan.yaml,state.yaml}`).

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Plan, TaskID, TaskStatus};
use crate::domain::ports::TaskStore;

pub struct FsTaskStore {
    root: PathBuf,
}

impl FsTaskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn task_dir(&self, task_id: &TaskID) -> PathBuf {
        self.root.join("tasks").join(task_id.as_str())
    }
}

#[async_trait]
impl TaskStore for FsTaskStore {
    async fn save_plan(&self, task_id: &TaskID, plan: &Plan) -> DomainResult<()> {
        let dir = self.task_dir(task_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Database(format!("create_dir_all {}: {e}", dir.display())))?;
        let yaml = serde_yaml::to_string(plan)?;
        tokio::fs::write(dir.join("plan.yaml"), yaml)
            .await
            .map_err(|e| DomainError::Database(format!("write plan.yaml: {e}")))?;
        Ok(())
    }

    async fn save_task_status(&self, task_id: &TaskID, status: TaskStatus) -> DomainResult<()> {
        let dir = self.task_dir(task_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Database(format!("create_dir_all {}: {e}", dir.display())))?;
        let state_path = dir.join("state.yaml");

        let mut value: serde_yaml::Value = match tokio::fs::read_to_string(&state_path).await {
            Ok(contents) => serde_yaml::from_str(&contents).unwrap_or(serde_yaml::Value::Mapping(Default::default())),
            Err(_) => serde_yaml::Value::Mapping(Default::default()),
        };

        if let serde_yaml::Value::Mapping(map) = &mut value {
            map.insert(
                serde_yaml::Value::String("status".to_string()),
                serde_yaml::to_value(status)?,
            );
        }

        let yaml = serde_yaml::to_string(&value)?;
        tokio::fs::write(&state_path, yaml)
            .await
            .map_err(|e| DomainError::Database(format!("write state.yaml: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Phase;

    #[tokio::test]
    async fn save_plan_then_save_status_preserves_unrelated_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTaskStore::new(dir.path());
        let task_id = TaskID::parse("TASK-001").unwrap();

        let plan = Plan::new(vec![Phase::new("p1", "sentinel gone")]);
        store.save_plan(&task_id, &plan).await.unwrap();
        assert!(dir.path().join("tasks/TASK-001/plan.yaml").exists());

        let state_path = dir.path().join("tasks/TASK-001/state.yaml");
        tokio::fs::write(&state_path, "weight: medium\nstatus: created\n").await.unwrap();

        store.save_task_status(&task_id, TaskStatus::Running).await.unwrap();

        let contents = tokio::fs::read_to_string(&state_path).await.unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&contents).unwrap();
        assert_eq!(value.get("status").unwrap().as_str().unwrap(), "running");
        assert_eq!(value.get("weight").unwrap().as_str().unwrap(), "medium");
    }
}
