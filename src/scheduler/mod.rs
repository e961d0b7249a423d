//! Scheduler: a dependency-aware, priority-ordered task queue.
//!
//! Decides which tasks are eligible to run now, respects dependencies and
//! priority, and releases dependency state when safe. All state lives
//! behind a single lock — operations never suspend, so the lock is held
//! only across brief, synchronous critical sections.

use std::collections::{BinaryHeap, HashMap, HashSet};

use tokio::sync::Mutex;
use tracing::instrument;

use crate::domain::models::{ScheduledTask, TaskID};

struct SchedulerState {
    queue: BinaryHeap<ScheduledTask>,
    completed: HashSet<TaskID>,
    running: HashSet<TaskID>,
    task_deps: HashMap<TaskID, HashSet<TaskID>>,
}

impl SchedulerState {
    fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            completed: HashSet::new(),
            running: HashSet::new(),
            task_deps: HashMap::new(),
        }
    }

    fn is_ready(&self, task: &ScheduledTask) -> bool {
        task.depends_on.iter().all(|dep| self.completed.contains(dep))
    }

    /// Retain only the completed entries still referenced by a remaining
    /// queued or running task's recorded dependencies. Diamond dependencies
    /// are retained until the last dependent clears.
    fn gc_completed(&mut self) {
        let mut referenced: HashSet<TaskID> = HashSet::new();
        for t in &self.queue {
            referenced.extend(t.depends_on.iter().cloned());
        }
        for id in &self.running {
            if let Some(deps) = self.task_deps.get(id) {
                referenced.extend(deps.iter().cloned());
            }
        }
        self.completed.retain(|id| referenced.contains(id));
    }
}

/// Single source of truth for "what runs next".
pub struct Scheduler {
    state: Mutex<SchedulerState>,
    max_concurrent: usize,
}

impl Scheduler {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            state: Mutex::new(SchedulerState::new()),
            max_concurrent,
        }
    }

    /// Enqueues a task and records its dependencies. Duplicate IDs
    /// (already queued or running) are silently ignored — scheduler
    /// operations never return errors; preconditions are guarded.
    #[instrument(skip(self, depends_on))]
    pub async fn add_task(
        &self,
        id: TaskID,
        title: impl Into<String> + std::fmt::Debug,
        depends_on: HashSet<TaskID>,
        priority: crate::domain::models::Priority,
    ) {
        let mut state = self.state.lock().await;
        if state.running.contains(&id) || state.queue.iter().any(|t| t.id == id) {
            return;
        }
        state.task_deps.insert(id.clone(), depends_on.clone());
        state.queue.push(ScheduledTask::new(id, title.into(), priority, depends_on));
    }

    /// Returns up to `min(n, maxConcurrent - running)` eligible tasks,
    /// marking each dispatched. Tasks whose deps aren't yet satisfied are
    /// held aside and pushed back, preserving their priority ordering.
    #[instrument(skip(self))]
    pub async fn next_ready(&self, n: usize) -> Vec<ScheduledTask> {
        let mut state = self.state.lock().await;
        let capacity = self.max_concurrent.saturating_sub(state.running.len());
        let want = n.min(capacity);
        if want == 0 {
            return Vec::new();
        }

        let mut ready = Vec::new();
        let mut held = Vec::new();

        while ready.len() < want {
            let Some(candidate) = state.queue.pop() else {
                break;
            };
            if state.is_ready(&candidate) {
                state.running.insert(candidate.id.clone());
                ready.push(candidate);
            } else {
                held.push(candidate);
            }
        }

        for t in held {
            state.queue.push(t);
        }

        ready
    }

    /// Removes the task from `running`, marks it completed, then garbage
    /// collects any completed dependency no remaining task still needs.
    #[instrument(skip(self))]
    pub async fn mark_completed(&self, id: &TaskID) {
        let mut state = self.state.lock().await;
        state.running.remove(id);
        state.completed.insert(id.clone());
        state.task_deps.remove(id);
        state.gc_completed();
    }

    /// Removes the task from `running` but leaves its recorded
    /// dependencies intact, so a later `Requeue` reproduces them.
    #[instrument(skip(self))]
    pub async fn mark_failed(&self, id: &TaskID) {
        let mut state = self.state.lock().await;
        state.running.remove(id);
    }

    /// Pushes a fresh queue entry using the retained dependencies from the
    /// original `AddTask` call and a new `CreatedAt`.
    #[instrument(skip(self, title))]
    pub async fn requeue(
        &self,
        id: TaskID,
        title: impl Into<String> + std::fmt::Debug,
        priority: crate::domain::models::Priority,
    ) {
        let mut state = self.state.lock().await;
        state.running.remove(&id);
        let deps = state.task_deps.get(&id).cloned().unwrap_or_default();
        state.queue.push(ScheduledTask::new(id, title.into(), priority, deps));
    }

    /// Idempotent removal from all internal maps.
    #[instrument(skip(self))]
    pub async fn remove_task(&self, id: &TaskID) {
        let mut state = self.state.lock().await;
        state.running.remove(id);
        state.task_deps.remove(id);
        let remaining: Vec<_> = state.queue.drain().filter(|t| &t.id != id).collect();
        state.queue.extend(remaining);
    }

    pub async fn is_complete(&self) -> bool {
        let state = self.state.lock().await;
        state.queue.is_empty() && state.running.is_empty()
    }

    pub async fn running_count(&self) -> usize {
        self.state.lock().await.running.len()
    }

    pub async fn queue_length(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn completed_count(&self) -> usize {
        self.state.lock().await.completed.len()
    }

    pub async fn get_running_tasks(&self) -> Vec<TaskID> {
        self.state.lock().await.running.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Priority;

    fn id(s: &str) -> TaskID {
        TaskID::parse(s).unwrap()
    }

    fn deps(ids: &[&str]) -> HashSet<TaskID> {
        ids.iter().map(|s| id(s)).collect()
    }

    #[tokio::test]
    async fn chain_scenario_dispatches_in_order() {
        let scheduler = Scheduler::new(4);
        scheduler.add_task(id("TASK-A"), "A", deps(&[]), Priority::DEFAULT).await;
        scheduler.add_task(id("TASK-B"), "B", deps(&["TASK-A"]), Priority::DEFAULT).await;
        scheduler.add_task(id("TASK-C"), "C", deps(&["TASK-B"]), Priority::DEFAULT).await;
        scheduler.add_task(id("TASK-D"), "D", deps(&["TASK-C"]), Priority::DEFAULT).await;

        for expected in ["TASK-A", "TASK-B", "TASK-C", "TASK-D"] {
            let ready = scheduler.next_ready(4).await;
            assert_eq!(ready.len(), 1);
            assert_eq!(ready[0].id.as_str(), expected);
            scheduler.mark_completed(&ready[0].id).await;
        }

        assert!(scheduler.is_complete().await);
        assert_eq!(scheduler.completed_count().await, 0, "all deps GC'd once D clears");
    }

    #[tokio::test]
    async fn diamond_scenario_retains_shared_dependency_until_last_clears() {
        let scheduler = Scheduler::new(4);
        scheduler.add_task(id("TASK-A"), "A", deps(&[]), Priority::DEFAULT).await;
        scheduler.add_task(id("TASK-B"), "B", deps(&["TASK-A"]), Priority::DEFAULT).await;
        scheduler.add_task(id("TASK-C"), "C", deps(&["TASK-A"]), Priority::DEFAULT).await;
        scheduler
            .add_task(id("TASK-D"), "D", deps(&["TASK-B", "TASK-C"]), Priority::DEFAULT)
            .await;

        let first = scheduler.next_ready(4).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id.as_str(), "TASK-A");
        scheduler.mark_completed(&first[0].id).await;

        let mut second = scheduler.next_ready(4).await;
        second.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].id.as_str(), "TASK-B");
        assert_eq!(second[1].id.as_str(), "TASK-C");

        assert_eq!(scheduler.completed_count().await, 1, "A retained: both B and C still reference it");

        scheduler.mark_completed(&id("TASK-B")).await;
        assert_eq!(
            scheduler.completed_count().await,
            2,
            "A and B both still referenced: D (queued) depends on B and C, C (running) depends on A"
        );

        scheduler.mark_completed(&id("TASK-C")).await;

        let third = scheduler.next_ready(4).await;
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].id.as_str(), "TASK-D");
        scheduler.mark_completed(&id("TASK-D")).await;

        assert!(scheduler.is_complete().await);
        assert_eq!(scheduler.completed_count().await, 0);
    }

    #[tokio::test]
    async fn mark_failed_preserves_deps_for_requeue() {
        let scheduler = Scheduler::new(4);
        scheduler.add_task(id("TASK-A"), "A", deps(&[]), Priority::DEFAULT).await;
        scheduler.add_task(id("TASK-B"), "B", deps(&["TASK-A"]), Priority::DEFAULT).await;

        scheduler.mark_completed(&id("TASK-A")).await;
        let ready = scheduler.next_ready(4).await;
        assert_eq!(ready[0].id.as_str(), "TASK-B");

        scheduler.mark_failed(&id("TASK-B")).await;
        scheduler.requeue(id("TASK-B"), "B", Priority::DEFAULT).await;

        let retried = scheduler.next_ready(4).await;
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].id.as_str(), "TASK-B");
        assert!(retried[0].depends_on.contains(&id("TASK-A")));
    }

    #[tokio::test]
    async fn respects_capacity() {
        let scheduler = Scheduler::new(1);
        scheduler.add_task(id("TASK-A"), "A", deps(&[]), Priority::DEFAULT).await;
        scheduler.add_task(id("TASK-B"), "B", deps(&[]), Priority::DEFAULT).await;

        let ready = scheduler.next_ready(4).await;
        assert_eq!(ready.len(), 1, "capacity caps dispatch even if more are ready");
        assert_eq!(scheduler.next_ready(4).await.len(), 0, "no capacity left");
    }

    #[tokio::test]
    async fn duplicate_add_task_is_ignored() {
        let scheduler = Scheduler::new(4);
        scheduler.add_task(id("TASK-A"), "A", deps(&[]), Priority::DEFAULT).await;
        scheduler.add_task(id("TASK-A"), "A again", deps(&[]), Priority::URGENT).await;
        assert_eq!(scheduler.queue_length().await, 1);
    }

    #[tokio::test]
    async fn remove_task_is_idempotent() {
        let scheduler = Scheduler::new(4);
        scheduler.add_task(id("TASK-A"), "A", deps(&[]), Priority::DEFAULT).await;
        scheduler.remove_task(&id("TASK-A")).await;
        scheduler.remove_task(&id("TASK-A")).await;
        assert_eq!(scheduler.queue_length().await, 0);
    }
}
