//! Prompt plumbing ports consumed by the Worker's phase loop.
//!
//! These represent the external prompt-template store and the sentinel-file
//! mechanism a phase's subprocess uses to signal completion. Template
//! authoring and the sentinel file format are out of scope; the Worker only
//! needs to fetch a phase's prompt text and check whether its sentinel is
//! still outstanding.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::TaskID;

#[async_trait]
pub trait PromptService: Send + Sync {
    /// Returns the prompt text for a given phase ID.
    async fn get(&self, phase_id: &str) -> DomainResult<String>;
}

#[async_trait]
pub trait PromptSink: Send + Sync {
    /// Writes the sentinel file for `(worktree, task_id, phase_id)`, seeded
    /// with `prompt`. The subprocess deletes this file to signal
    /// `completion_sentinel` was reached within `max_iterations`.
    async fn create(
        &self,
        worktree: &str,
        task_id: &TaskID,
        phase_id: &str,
        prompt: &str,
        max_iterations: u32,
        completion_sentinel: &str,
    ) -> DomainResult<()>;

    /// True while the sentinel file for `(worktree, task_id, phase_id)` is
    /// still present, i.e. the phase has not yet signalled completion.
    async fn exists(&self, worktree: &str, task_id: &TaskID, phase_id: &str) -> DomainResult<bool>;
}
