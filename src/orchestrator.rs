//! Orchestrator loop: the ticker that drains the scheduler into the worker
//! pool, observes completions, and publishes events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::automation::AutomationEngine;
use crate::domain::models::{event_type, Event, Plan, Task, WorkerStatus};
use crate::event_bus::EventBus;
use crate::scheduler::Scheduler;
use crate::worker_pool::WorkerPool;

/// A task ready to run, paired with the plan its worker will execute.
/// The scheduler only tracks identity/dependency bookkeeping; the
/// orchestrator is responsible for resolving a `ScheduledTask` into a full
/// `Task` + `Plan` before handing it to the pool.
#[async_trait::async_trait]
pub trait TaskLoader: Send + Sync {
    async fn load(&self, id: &crate::domain::models::TaskID) -> crate::domain::errors::DomainResult<(Task, Plan)>;
}

pub struct Orchestrator {
    scheduler: Arc<Scheduler>,
    pool: Arc<WorkerPool>,
    automation: Arc<AutomationEngine>,
    task_loader: Arc<dyn TaskLoader>,
    event_bus: EventBus,
    poll_interval: Duration,
    max_concurrent: usize,
}

impl Orchestrator {
    pub fn new(
        scheduler: Arc<Scheduler>,
        pool: Arc<WorkerPool>,
        automation: Arc<AutomationEngine>,
        task_loader: Arc<dyn TaskLoader>,
        event_bus: EventBus,
        poll_interval: Duration,
        max_concurrent: usize,
    ) -> Self {
        Self {
            scheduler,
            pool,
            automation,
            task_loader,
            event_bus,
            poll_interval,
            max_concurrent,
        }
    }

    /// Runs the tick loop until `shutdown` fires or the scheduler and pool
    /// both drain to empty.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("orchestrator shutting down, stopping all workers");
                        for w in self.pool.get_workers().await {
                            if let Err(err) = self.pool.stop_worker(&w.task_id).await {
                                warn!(%err, task_id = %w.task_id, "failed to stop worker during shutdown");
                            }
                        }
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.tick().await;
                    if self.scheduler.is_complete().await && self.pool.active_count().await == 0 {
                        info!("scheduler and pool both drained; orchestrator done");
                        return;
                    }
                }
            }
        }
    }

    async fn tick(&self) {
        self.check_workers().await;
        self.schedule_next().await;
    }

    async fn check_workers(&self) {
        for snapshot in self.pool.get_workers().await {
            match snapshot.status {
                WorkerStatus::Complete => {
                    // TASK_COMPLETED is published by the worker itself, right
                    // after it writes the terminal task status, not here,
                    // to avoid a double count in the Count/Threshold evaluators.
                    self.scheduler.mark_completed(&snapshot.task_id).await;
                    if let Err(err) = self.automation.increment_cooldown_counter().await {
                        warn!(%err, "failed to advance cooldown counters");
                    }
                    if let Err(err) = self.pool.cleanup_worktree(&snapshot.task_id, true, false).await {
                        warn!(%err, task_id = %snapshot.task_id, "worktree cleanup failed");
                    }
                    self.pool.remove_worker(&snapshot.task_id).await;
                }
                WorkerStatus::Failed => {
                    self.scheduler.mark_failed(&snapshot.task_id).await;
                    self.event_bus.publish(Event::new(event_type::TASK_FAILED).with_task(snapshot.task_id.clone()));
                    if let Err(err) = self.pool.cleanup_worktree(&snapshot.task_id, false, true).await {
                        warn!(%err, task_id = %snapshot.task_id, "worktree cleanup failed");
                    }
                    self.pool.remove_worker(&snapshot.task_id).await;
                }
                WorkerStatus::Paused | WorkerStatus::Idle | WorkerStatus::Running => {}
            }
        }
    }

    async fn schedule_next(&self) {
        loop {
            let capacity = self.max_concurrent.saturating_sub(self.pool.active_count().await);
            if capacity == 0 {
                return;
            }
            let ready = self.scheduler.next_ready(capacity).await;
            if ready.is_empty() {
                return;
            }
            for scheduled in ready {
                match self.task_loader.load(&scheduled.id).await {
                    Ok((task, plan)) => {
                        if let Err(err) = self.pool.spawn_worker(task, plan).await {
                            warn!(%err, task_id = %scheduled.id, "failed to spawn worker");
                            self.scheduler.mark_failed(&scheduled.id).await;
                        }
                    }
                    Err(err) => {
                        warn!(%err, task_id = %scheduled.id, "failed to load task/plan for scheduled task");
                        self.scheduler.mark_failed(&scheduled.id).await;
                    }
                }
            }
        }
    }
}
