//! Automation Engine: on each inbound `Event`, decides which triggers fire,
//! enforces cooldowns, and enacts the trigger's `Mode`.

pub mod cooldown;
pub mod evaluators;
pub mod schedule_runner;

pub use schedule_runner::ScheduleRunner;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Counter, Event, Execution, ExecutionStatus, Mode, Notification, NotificationSource, Trigger, TriggerType,
};
use crate::domain::ports::{Database, ExecutionStats, TaskCreator};
use crate::event_bus::EventBus;

use evaluators::Evaluator;

/// The three fields §5 names as sharing a single lock: the evaluator
/// registry, `lastGlobalTrigger`, and the `TaskCreator` reference. Counter
/// and trigger state are synchronized in the database instead.
struct Shared {
    evaluators: HashMap<TriggerType, Arc<dyn Evaluator>>,
    last_global_trigger: Option<DateTime<Utc>>,
    task_creator: Option<Arc<dyn TaskCreator>>,
}

pub struct AutomationEngine {
    shared: RwLock<Shared>,
    db: Arc<dyn Database>,
    event_bus: EventBus,
    enabled: bool,
    global_cooldown: Duration,
    team_mode: bool,
}

impl AutomationEngine {
    pub fn new(
        db: Arc<dyn Database>,
        event_bus: EventBus,
        enabled: bool,
        global_cooldown: Duration,
        team_mode: bool,
    ) -> Self {
        Self {
            shared: RwLock::new(Shared {
                evaluators: evaluators::default_registry(),
                last_global_trigger: None,
                task_creator: None,
            }),
            db,
            event_bus,
            enabled,
            global_cooldown,
            team_mode,
        }
    }

    pub async fn set_task_creator(&self, task_creator: Arc<dyn TaskCreator>) {
        self.shared.write().await.task_creator = Some(task_creator);
    }

    /// Main entry: evaluate every enabled trigger against `event`, firing
    /// whichever ones pass their condition and cooldown.
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn handle_event(&self, event: &Event) -> DomainResult<()> {
        if !self.enabled {
            return Ok(());
        }

        {
            let shared = self.shared.read().await;
            if let Some(last) = shared.last_global_trigger {
                if Utc::now() - last < self.global_cooldown {
                    return Ok(());
                }
            }
        }

        let triggers = self.db.load_all_triggers().await?;
        for trigger in triggers.into_iter().filter(|t| t.enabled) {
            let evaluator = {
                let shared = self.shared.read().await;
                shared.evaluators.get(&trigger.trigger_type).cloned()
            };
            let Some(evaluator) = evaluator else { continue };

            let verdict = evaluator.evaluate(&trigger, event, self.db.as_ref()).await?;
            if !verdict.should_fire {
                continue;
            }
            if !self.check_cooldown(&trigger).await? {
                continue;
            }
            self.fire_trigger(&trigger, &verdict.reason).await?;
        }

        Ok(())
    }

    /// Manual fire: bypasses condition evaluation but still records an
    /// execution and applies the trigger's mode.
    #[instrument(skip(self))]
    pub async fn run_trigger(&self, trigger_id: Uuid) -> DomainResult<()> {
        let trigger = self
            .db
            .load_trigger(trigger_id)
            .await?
            .ok_or(DomainError::TriggerNotFound(trigger_id))?;
        self.fire_trigger(&trigger, "manual trigger").await
    }

    /// Called by the orchestrator after every task completion to advance
    /// the task-count leg of every trigger's cooldown.
    #[instrument(skip(self))]
    pub async fn increment_cooldown_counter(&self) -> DomainResult<()> {
        let triggers = self.db.load_all_triggers().await?;
        for trigger in triggers.into_iter().filter(|t| t.cooldown.tasks.is_some()) {
            self.db.increment_counter(trigger.id, Counter::COOLDOWN_METRIC).await?;
        }
        Ok(())
    }

    pub async fn get_stats(&self) -> DomainResult<ExecutionStats> {
        self.db.get_execution_stats().await
    }

    pub async fn set_trigger_enabled(&self, trigger_id: Uuid, enabled: bool) -> DomainResult<()> {
        self.db.set_trigger_enabled(trigger_id, enabled).await
    }

    /// Both legs (task-count and duration), when configured, must be
    /// satisfied for a trigger to be allowed to fire. The duration leg is
    /// only in effect in team mode, matching `ScheduleRunner`'s own gating.
    async fn check_cooldown(&self, trigger: &Trigger) -> DomainResult<bool> {
        if let Some(required) = trigger.cooldown.tasks {
            let count = self.db.get_counter(trigger.id, Counter::COOLDOWN_METRIC).await?.map_or(0, |c| c.count);
            if count < i64::from(required) {
                return Ok(false);
            }
        }
        if self.team_mode {
            if let Some(duration) = trigger.cooldown.duration {
                if let Some(last) = trigger.last_triggered_at {
                    if Utc::now() - last < duration {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    #[instrument(skip(self, reason))]
    async fn fire_trigger(&self, trigger: &Trigger, reason: &str) -> DomainResult<()> {
        let now = Utc::now();
        {
            self.shared.write().await.last_global_trigger = Some(now);
        }

        let execution = Execution::new(trigger.id, reason);
        self.db.create_execution(&execution).await?;

        let _new_count = self.db.increment_trigger_count(trigger.id, now).await?;

        // Observability-only: a failed cooldown reset may cause future
        // trigger storms but must not block this firing.
        if let Err(err) = self.db.reset_counter(trigger.id, Counter::COOLDOWN_METRIC).await {
            error!(%err, trigger_id = %trigger.id, "failed to reset cooldown counter after firing");
        }

        match trigger.mode {
            Mode::Auto => self.dispatch_auto(trigger, &execution).await,
            Mode::Approval => self.dispatch_approval(trigger, &execution).await,
            Mode::Notify => self.dispatch_notify(trigger, &execution).await,
        }
    }

    async fn dispatch_auto(&self, trigger: &Trigger, execution: &Execution) -> DomainResult<()> {
        let task_creator = self.shared.read().await.task_creator.clone();
        let Some(task_creator) = task_creator else {
            self.db
                .update_execution_status(execution.id, ExecutionStatus::Skipped, Some("no task creator configured".into()))
                .await?;
            return Ok(());
        };

        match task_creator.create_automation_task(&trigger.action.template, trigger.id, &execution.reason).await {
            Ok(task_id) => {
                task_creator.start_automation_task(&task_id).await?;
                self.db.update_execution_status(execution.id, ExecutionStatus::Running, None).await?;
                Ok(())
            }
            Err(err) => {
                self.db
                    .update_execution_status(execution.id, ExecutionStatus::Failed, Some(err.to_string()))
                    .await?;
                Err(err)
            }
        }
    }

    async fn dispatch_approval(&self, trigger: &Trigger, execution: &Execution) -> DomainResult<()> {
        let task_creator = self.shared.read().await.task_creator.clone();
        let Some(task_creator) = task_creator else {
            self.db
                .update_execution_status(execution.id, ExecutionStatus::Skipped, Some("no task creator configured".into()))
                .await?;
            return Ok(());
        };

        task_creator
            .create_automation_task(&trigger.action.template, trigger.id, &execution.reason)
            .await?;

        let notification = Notification::new(
            "automation_pending",
            format!("Automation pending approval: {}", trigger.action.template),
            execution.reason.clone(),
            NotificationSource::Trigger,
            trigger.id.to_string(),
        );
        if let Err(err) = self.db.create_notification(&notification).await {
            warn!(%err, "failed to write approval notification");
        }
        Ok(())
    }

    async fn dispatch_notify(&self, trigger: &Trigger, execution: &Execution) -> DomainResult<()> {
        let notification = Notification::new(
            "automation_notify",
            format!("Trigger fired: {}", trigger.action.template),
            execution.reason.clone(),
            NotificationSource::Trigger,
            trigger.id.to_string(),
        );
        if let Err(err) = self.db.create_notification(&notification).await {
            warn!(%err, "failed to write notify-mode notification");
        }
        self.db.update_execution_status(execution.id, ExecutionStatus::Completed, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex as StdMutex;

    use crate::domain::models::{event_type, Category, Cooldown, Metric, TaskID, TaskPriority, TaskQueue, TriggerAction, TriggerCondition, Weight};

    #[derive(Default)]
    struct InMemoryDb {
        triggers: StdMutex<StdHashMap<Uuid, Trigger>>,
        counters: StdMutex<StdHashMap<(Uuid, String), i64>>,
        executions: StdMutex<Vec<Execution>>,
        metrics: StdMutex<Vec<Metric>>,
        notifications: StdMutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Database for InMemoryDb {
        async fn save_trigger(&self, trigger: &Trigger) -> DomainResult<()> {
            self.triggers.lock().unwrap().insert(trigger.id, trigger.clone());
            Ok(())
        }
        async fn load_trigger(&self, id: Uuid) -> DomainResult<Option<Trigger>> {
            Ok(self.triggers.lock().unwrap().get(&id).cloned())
        }
        async fn load_all_triggers(&self) -> DomainResult<Vec<Trigger>> {
            Ok(self.triggers.lock().unwrap().values().cloned().collect())
        }
        async fn increment_trigger_count(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<u64> {
            let mut triggers = self.triggers.lock().unwrap();
            let trigger = triggers.get_mut(&id).expect("trigger exists");
            trigger.trigger_count += 1;
            trigger.last_triggered_at = Some(now);
            Ok(trigger.trigger_count)
        }
        async fn set_trigger_enabled(&self, id: Uuid, enabled: bool) -> DomainResult<()> {
            if let Some(t) = self.triggers.lock().unwrap().get_mut(&id) {
                t.enabled = enabled;
            }
            Ok(())
        }
        async fn get_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<Option<Counter>> {
            let count = self.counters.lock().unwrap().get(&(trigger_id, metric.to_string())).copied();
            Ok(count.map(|count| Counter { trigger_id, metric: metric.to_string(), count, last_reset_at: Utc::now() }))
        }
        async fn increment_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<()> {
            *self.counters.lock().unwrap().entry((trigger_id, metric.to_string())).or_insert(0) += 1;
            Ok(())
        }
        async fn increment_and_get_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<i64> {
            let mut counters = self.counters.lock().unwrap();
            let entry = counters.entry((trigger_id, metric.to_string())).or_insert(0);
            *entry += 1;
            Ok(*entry)
        }
        async fn reset_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<()> {
            self.counters.lock().unwrap().insert((trigger_id, metric.to_string()), 0);
            Ok(())
        }
        async fn create_execution(&self, execution: &Execution) -> DomainResult<()> {
            self.executions.lock().unwrap().push(execution.clone());
            Ok(())
        }
        async fn update_execution_status(&self, id: Uuid, status: ExecutionStatus, error_message: Option<String>) -> DomainResult<()> {
            let mut executions = self.executions.lock().unwrap();
            if let Some(e) = executions.iter_mut().find(|e| e.id == id) {
                e.status = status;
                e.error_message = error_message;
                if Execution::is_terminal(status) {
                    e.completed_at = Some(Utc::now());
                }
            }
            Ok(())
        }
        async fn get_recent_executions(&self, limit: usize) -> DomainResult<Vec<Execution>> {
            let executions = self.executions.lock().unwrap();
            Ok(executions.iter().rev().take(limit).cloned().collect())
        }
        async fn record_metric(&self, metric: &Metric) -> DomainResult<()> {
            self.metrics.lock().unwrap().push(metric.clone());
            Ok(())
        }
        async fn get_latest_metric(&self, name: &str) -> DomainResult<Option<Metric>> {
            Ok(self.metrics.lock().unwrap().iter().filter(|m| m.name == name).max_by_key(|m| m.recorded_at).cloned())
        }
        async fn create_notification(&self, notification: &Notification) -> DomainResult<()> {
            self.notifications.lock().unwrap().push(notification.clone());
            Ok(())
        }
        async fn get_active_notifications(&self) -> DomainResult<Vec<Notification>> {
            Ok(self.notifications.lock().unwrap().iter().filter(|n| !n.dismissed).cloned().collect())
        }
        async fn dismiss_notification(&self, id: Uuid) -> DomainResult<()> {
            if let Some(n) = self.notifications.lock().unwrap().iter_mut().find(|n| n.id == id) {
                n.dismissed = true;
            }
            Ok(())
        }
        async fn dismiss_all_notifications(&self) -> DomainResult<()> {
            for n in self.notifications.lock().unwrap().iter_mut() {
                n.dismissed = true;
            }
            Ok(())
        }
        async fn get_execution_stats(&self) -> DomainResult<ExecutionStats> {
            let executions = self.executions.lock().unwrap();
            let mut stats = ExecutionStats::default();
            for e in executions.iter() {
                stats.total += 1;
                match e.status {
                    ExecutionStatus::Completed => stats.completed += 1,
                    ExecutionStatus::Failed => stats.failed += 1,
                    ExecutionStatus::Skipped => stats.skipped += 1,
                    ExecutionStatus::Pending | ExecutionStatus::Running => stats.pending += 1,
                }
            }
            Ok(stats)
        }
    }

    struct NoopTaskCreator;

    #[async_trait]
    impl TaskCreator for NoopTaskCreator {
        async fn create_automation_task(&self, _template: &str, _trigger_id: Uuid, _reason: &str) -> DomainResult<TaskID> {
            Ok(TaskID::new_unchecked("AUTO-001"))
        }
        async fn start_automation_task(&self, _task_id: &TaskID) -> DomainResult<()> {
            Ok(())
        }
    }

    fn count_trigger(mode: Mode) -> Trigger {
        Trigger::new(
            TriggerType::Count,
            mode,
            TriggerCondition::Count {
                metric: "tasks_completed".to_string(),
                threshold: 3,
                weight_filter: None,
                category_filter: None,
            },
            TriggerAction { template: "T1".to_string(), priority: TaskPriority::Normal, queue: TaskQueue::Active },
            Cooldown::default(),
        )
    }

    fn task_completed_event() -> Event {
        Event::new(event_type::TASK_COMPLETED).with_weight(Weight::Small).with_category(Category::Feature)
    }

    #[tokio::test]
    async fn count_trigger_fires_exactly_once_at_threshold() {
        let db = Arc::new(InMemoryDb::default());
        let trigger = count_trigger(Mode::Notify);
        db.save_trigger(&trigger).await.unwrap();

        let engine = Arc::new(AutomationEngine::new(db.clone(), EventBus::new(), true, Duration::zero(), true));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.handle_event(&task_completed_event()).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let reloaded = db.load_trigger(trigger.id).await.unwrap().unwrap();
        assert_eq!(reloaded.trigger_count, 1, "exactly one firing across 5 concurrent completions");

        let counter = db.get_counter(trigger.id, "tasks_completed").await.unwrap().unwrap();
        assert_eq!(counter.count, 2, "3rd event fired+reset to 0, remaining 2 events incremented from there");
    }

    #[tokio::test]
    async fn approval_mode_creates_pending_execution_and_notification_without_starting() {
        let db = Arc::new(InMemoryDb::default());
        let trigger = count_trigger(Mode::Approval);
        db.save_trigger(&trigger).await.unwrap();

        let engine = AutomationEngine::new(db.clone(), EventBus::new(), true, Duration::zero(), true);
        engine.set_task_creator(Arc::new(NoopTaskCreator)).await;

        for _ in 0..3 {
            engine.handle_event(&task_completed_event()).await.unwrap();
        }

        let executions = db.executions.lock().unwrap();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].status, ExecutionStatus::Pending, "approval mode leaves execution pending for a human");

        let notifications = db.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].notification_type, "automation_pending");
    }

    #[tokio::test]
    async fn global_cooldown_blocks_second_firing() {
        let db = Arc::new(InMemoryDb::default());
        let trigger = count_trigger(Mode::Notify);
        db.save_trigger(&trigger).await.unwrap();

        let engine = AutomationEngine::new(db.clone(), EventBus::new(), true, Duration::hours(1), true);

        for _ in 0..3 {
            engine.handle_event(&task_completed_event()).await.unwrap();
        }
        // Second batch would cross threshold again, but global cooldown blocks HandleEvent entirely.
        for _ in 0..3 {
            engine.handle_event(&task_completed_event()).await.unwrap();
        }

        let reloaded = db.load_trigger(trigger.id).await.unwrap().unwrap();
        assert_eq!(reloaded.trigger_count, 1);
    }
}
