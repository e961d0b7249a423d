//! Prompt template store and sentinel-file mechanism the Worker's phase
//! loop drives subprocesses with.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::TaskID;
use crate::domain::ports::{PromptService, PromptSink};

/// Reads phase prompt templates from `<root>/prompts/<phase_id>.md`.
pub struct FilePromptService {
    root: PathBuf,
}

impl FilePromptService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PromptService for FilePromptService {
    async fn get(&self, phase_id: &str) -> DomainResult<String> {
        let path = self.root.join("prompts").join(format!("{phase_id}.md"));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::Database(format!("read prompt {}: {e}", path.display())))
    }
}

fn sentinel_path(worktree: &str, task_id: &TaskID, phase_id: &str) -> PathBuf {
    Path::new(worktree).join(format!(".taskorc-sentinel-{}-{phase_id}", task_id.as_str()))
}

/// Seeds and watches the per-phase sentinel file a phase's subprocess
/// deletes to signal completion.
pub struct FilePromptSink;

impl FilePromptSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FilePromptSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptSink for FilePromptSink {
    async fn create(
        &self,
        worktree: &str,
        task_id: &TaskID,
        phase_id: &str,
        prompt: &str,
        max_iterations: u32,
        completion_sentinel: &str,
    ) -> DomainResult<()> {
        let path = sentinel_path(worktree, task_id, phase_id);
        let contents = format!(
            "# max_iterations: {max_iterations}\n# completion_sentinel: {completion_sentinel}\n\n{prompt}\n"
        );
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| DomainError::Subprocess(format!("write sentinel {}: {e}", path.display())))?;
        Ok(())
    }

    async fn exists(&self, worktree: &str, task_id: &TaskID, phase_id: &str) -> DomainResult<bool> {
        Ok(tokio::fs::try_exists(sentinel_path(worktree, task_id, phase_id))
            .await
            .map_err(|e| DomainError::Subprocess(format!("stat sentinel: {e}")))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sentinel_exists_until_subprocess_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FilePromptSink::new();
        let task_id = TaskID::parse("TASK-001").unwrap();

        sink.create(dir.path().to_str().unwrap(), &task_id, "design", "do the thing", 30, "PHASE_COMPLETE")
            .await
            .unwrap();
        assert!(sink.exists(dir.path().to_str().unwrap(), &task_id, "design").await.unwrap());

        tokio::fs::remove_file(sentinel_path(dir.path().to_str().unwrap(), &task_id, "design")).await.unwrap();
        assert!(!sink.exists(dir.path().to_str().unwrap(), &task_id, "design").await.unwrap());
    }

    #[tokio::test]
    async fn get_reads_prompt_template_by_phase_id() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("prompts")).await.unwrap();
        tokio::fs::write(dir.path().join("prompts/design.md"), "design this").await.unwrap();

        let service = FilePromptService::new(dir.path());
        assert_eq!(service.get("design").await.unwrap(), "design this");
    }
}
