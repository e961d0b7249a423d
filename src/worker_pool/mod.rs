//! Worker Pool: bounded concurrency over per-task `Worker`s.

mod worker;

use std::collections::HashMap;
use std::sync::Arc;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Plan, Task, TaskID, WorkerID, WorkerSnapshot, WorkerStatus};
use crate::domain::models::config::Config;
use crate::domain::ports::{PromptService, PromptSink, TaskStore, WorktreeManager};
use crate::event_bus::EventBus;

pub use worker::run_worker;

/// Shared, mutable slice of one worker's state that both the pool and the
/// running worker task touch. The pool holds this; it never holds a
/// reference back to the spawned task itself, so there is no reference
/// cycle — the pool simply outlives every worker.
pub(crate) struct WorkerEntry {
    pub snapshot: RwLock<WorkerSnapshot>,
    pub cancel_tx: watch::Sender<bool>,
    /// Process-group ID of the currently running phase subprocess, if any.
    pub pgid: Mutex<Option<i32>>,
}

pub struct WorkerPool {
    entries: RwLock<HashMap<TaskID, Arc<WorkerEntry>>>,
    max_workers: usize,
    worktree_manager: Arc<dyn WorktreeManager>,
    task_store: Arc<dyn TaskStore>,
    prompts: Arc<dyn PromptService>,
    prompt_sink: Arc<dyn PromptSink>,
    event_bus: EventBus,
    config: Config,
}

impl WorkerPool {
    pub fn new(
        max_workers: usize,
        worktree_manager: Arc<dyn WorktreeManager>,
        task_store: Arc<dyn TaskStore>,
        prompts: Arc<dyn PromptService>,
        prompt_sink: Arc<dyn PromptSink>,
        event_bus: EventBus,
        config: Config,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_workers,
            worktree_manager,
            task_store,
            prompts,
            prompt_sink,
            event_bus,
            config,
        }
    }

    /// Creates a worktree, registers the worker under lock, and launches its
    /// run loop on an independent task. Fails with `WorkerAlreadyExists` or
    /// `PoolAtCapacity` without side effects.
    #[instrument(skip(self, plan), fields(task_id = %task.id))]
    pub async fn spawn_worker(self: &Arc<Self>, task: Task, plan: Plan) -> DomainResult<WorkerID> {
        {
            let entries = self.entries.read().await;
            if entries.contains_key(&task.id) {
                return Err(DomainError::WorkerAlreadyExists(task.id.to_string()));
            }
            if entries.len() >= self.max_workers {
                return Err(DomainError::PoolAtCapacity(self.max_workers));
            }
        }

        let worktree = self.worktree_manager.create(&task.id).await?;
        let worker_id = WorkerID::for_task(&task.id);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let entry = Arc::new(WorkerEntry {
            snapshot: RwLock::new(WorkerSnapshot {
                worker_id: worker_id.clone(),
                task_id: task.id.clone(),
                worktree_path: worktree.path.clone(),
                status: WorkerStatus::Running,
                started_at: chrono::Utc::now(),
                error: None,
            }),
            cancel_tx,
            pgid: Mutex::new(None),
        });

        {
            let mut entries = self.entries.write().await;
            // Re-check under the write lock: another caller may have raced
            // us between the read-lock check above and acquiring this one.
            if entries.contains_key(&task.id) {
                return Err(DomainError::WorkerAlreadyExists(task.id.to_string()));
            }
            if entries.len() >= self.max_workers {
                return Err(DomainError::PoolAtCapacity(self.max_workers));
            }
            entries.insert(task.id.clone(), entry.clone());
        }

        let pool = self.clone();
        let worktree_path = worktree.path.clone();
        tokio::spawn(async move {
            run_worker(
                pool,
                task,
                plan,
                worktree_path,
                entry,
                cancel_rx,
            )
            .await;
        });

        Ok(worker_id)
    }

    /// Cancels the worker's context and signals its process group.
    /// Idempotent: repeated calls re-signal rather than error.
    #[instrument(skip(self))]
    pub async fn stop_worker(&self, task_id: &TaskID) -> DomainResult<()> {
        let entry = {
            let entries = self.entries.read().await;
            entries.get(task_id).cloned()
        };
        let Some(entry) = entry else {
            return Err(DomainError::WorkerNotFound(task_id.to_string()));
        };

        entry.cancel_tx.send_replace(true);

        if let Some(pgid) = *entry.pgid.lock().await {
            if let Err(err) = signal::killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
                // ESRCH means the group is already gone — expected on a
                // second Stop() call, not an error worth surfacing.
                warn!(%task_id, %err, "killpg failed (process group may already be gone)");
            }
        }

        Ok(())
    }

    pub async fn remove_worker(&self, task_id: &TaskID) {
        self.entries.write().await.remove(task_id);
    }

    pub async fn active_count(&self) -> usize {
        let entries = self.entries.read().await;
        let mut count = 0;
        for entry in entries.values() {
            if entry.snapshot.read().await.status == WorkerStatus::Running {
                count += 1;
            }
        }
        count
    }

    pub async fn get_worker(&self, task_id: &TaskID) -> Option<WorkerSnapshot> {
        let entry = self.entries.read().await.get(task_id).cloned()?;
        Some(entry.snapshot.read().await.clone())
    }

    pub async fn get_workers(&self) -> Vec<WorkerSnapshot> {
        let entries = self.entries.read().await;
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries.values() {
            out.push(entry.snapshot.read().await.clone());
        }
        out
    }

    pub async fn cleanup_worktree(&self, task_id: &TaskID, completed: bool, failed: bool) -> DomainResult<()> {
        self.worktree_manager.cleanup(task_id, completed, failed).await
    }
}
