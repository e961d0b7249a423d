//! Per-task phase-iteration loop, subprocess management, process-group kill.
//!
//! Deliberately iterative, not recursive: an arbitrarily long phase chain
//! must not grow the call stack.

use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::domain::models::{event_type, Event, Plan, Task, TaskStatus, WorkerStatus};
use crate::worker_pool::{WorkerEntry, WorkerPool};

/// Outcome of the phase loop, before the finalization backstop runs.
enum LoopExit {
    /// The plan was exhausted; terminal status already written.
    Complete,
    /// Cancelled mid-wait; terminal status already written.
    Paused,
    /// Subprocess spawn/exit failure; terminal status already written.
    Failed,
    /// Phase's sentinel is still present — an external driver will resume
    /// this phase later. Status is deliberately left as-is; the
    /// finalization backstop promotes it to `Complete` if still `Running`.
    AwaitingExternalResume,
}

#[instrument(skip_all, fields(task_id = %task.id))]
pub(crate) async fn run_worker(
    pool: Arc<WorkerPool>,
    mut task: Task,
    mut plan: Plan,
    worktree_path: String,
    entry: Arc<WorkerEntry>,
    cancel_rx: watch::Receiver<bool>,
) {
    let exit = run_phases(&pool, &mut task, &mut plan, &worktree_path, &entry, cancel_rx).await;

    // Finalization: runs on every exit path, including early returns from
    // inside `run_phases`. The entry is deliberately left in the pool here.
    // The orchestrator observes the terminal status on its next tick and
    // removes it after reacting (scheduler advance, cooldown, worktree
    // cleanup); removing it eagerly would let a terminal worker vanish
    // before the orchestrator ever sees it.
    let mut snapshot = entry.snapshot.write().await;
    if matches!(exit, LoopExit::AwaitingExternalResume) && snapshot.status == WorkerStatus::Running {
        snapshot.status = WorkerStatus::Complete;
    }
}

async fn run_phases(
    pool: &Arc<WorkerPool>,
    task: &mut Task,
    plan: &mut Plan,
    worktree_path: &str,
    entry: &Arc<WorkerEntry>,
    mut cancel_rx: watch::Receiver<bool>,
) -> LoopExit {
    loop {
        let Some(phase) = plan.current_phase().cloned() else {
            set_status(entry, WorkerStatus::Complete, None).await;
            return LoopExit::Complete;
        };

        let prompt = match pool.prompts.get(&phase.id).await {
            Ok(p) => p,
            Err(err) => {
                let msg = format!("prompt lookup failed for phase {}: {err}", phase.id);
                error!(%msg);
                set_status(entry, WorkerStatus::Failed, Some(msg)).await;
                return LoopExit::Failed;
            }
        };

        if let Err(err) = pool
            .prompt_sink
            .create(
                worktree_path,
                &task.id,
                &phase.id,
                &prompt,
                pool.config.max_iterations,
                &pool.config.completion_sentinel,
            )
            .await
        {
            let msg = format!("prompt sink create failed for phase {}: {err}", phase.id);
            error!(%msg);
            set_status(entry, WorkerStatus::Failed, Some(msg)).await;
            return LoopExit::Failed;
        }

        let mut cmd = build_command(&pool.config.worker_command, task, &phase.id, worktree_path);
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                let msg = format!("subprocess spawn failed: {err}");
                error!(%msg);
                set_status(entry, WorkerStatus::Failed, Some(msg)).await;
                return LoopExit::Failed;
            }
        };

        if let Some(pid) = child.id() {
            *entry.pgid.lock().await = Some(pid as i32);
        }

        info!(phase = %phase.id, "phase started");

        tokio::select! {
            changed = cancel_rx.changed() => {
                if changed.is_ok() {
                    let _ = child.kill().await;
                    set_status(entry, WorkerStatus::Paused, None).await;
                    return LoopExit::Paused;
                }
            }
            result = child.wait() => {
                *entry.pgid.lock().await = None;
                match result {
                    Ok(status) if status.success() => {}
                    Ok(status) => {
                        let msg = format!("phase {} subprocess exited with {status}", phase.id);
                        warn!(%msg);
                        set_status(entry, WorkerStatus::Failed, Some(msg)).await;
                        return LoopExit::Failed;
                    }
                    Err(err) => {
                        let msg = format!("phase {} subprocess wait failed: {err}", phase.id);
                        error!(%msg);
                        set_status(entry, WorkerStatus::Failed, Some(msg)).await;
                        return LoopExit::Failed;
                    }
                }
            }
        }

        match pool.prompt_sink.exists(worktree_path, &task.id, &phase.id).await {
            Ok(true) => return LoopExit::AwaitingExternalResume,
            Ok(false) => {}
            Err(err) => {
                let msg = format!("prompt sink exists-check failed for phase {}: {err}", phase.id);
                error!(%msg);
                set_status(entry, WorkerStatus::Failed, Some(msg)).await;
                return LoopExit::Failed;
            }
        }

        plan.mark_completed(&phase.id);
        if let Err(err) = pool.task_store.save_plan(&task.id, plan).await {
            warn!(%err, "failed to persist plan after phase completion");
        }
        pool.event_bus.publish(
            Event::new(event_type::PHASE_COMPLETED)
                .with_task(task.id.clone())
                .with_phase(phase.id.clone()),
        );

        if plan.current_phase().is_none() {
            task.status = TaskStatus::Completed;
            if let Err(err) = pool.task_store.save_task_status(&task.id, task.status).await {
                warn!(%err, "failed to persist terminal task status");
            }
            pool.event_bus.publish(Event::new(event_type::TASK_COMPLETED).with_task(task.id.clone()));
            set_status(entry, WorkerStatus::Complete, None).await;
            return LoopExit::Complete;
        }
    }
}

async fn set_status(entry: &Arc<WorkerEntry>, status: WorkerStatus, error: Option<String>) {
    let mut snapshot = entry.snapshot.write().await;
    snapshot.status = status;
    snapshot.error = error;
}

/// Substitutes `{task_id}`, `{phase_id}`, `{worktree}` into each templated
/// arg and sets the child up as its own process-group leader so a later
/// `killpg` reaches every descendant, not just the direct child.
fn build_command(template: &[String], task: &Task, phase_id: &str, worktree: &str) -> Command {
    let substitute = |s: &str| {
        s.replace("{task_id}", task.id.as_str())
            .replace("{phase_id}", phase_id)
            .replace("{worktree}", worktree)
    };

    let program = template.first().map(|s| substitute(s)).unwrap_or_default();
    let mut cmd = Command::new(program);
    for arg in template.iter().skip(1) {
        cmd.arg(substitute(arg));
    }
    cmd.current_dir(worktree);
    cmd.kill_on_drop(true);

    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    cmd
}
