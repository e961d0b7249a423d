//! `SqliteDatabase`: the `Database` port against the five engine-owned tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_datetime, parse_optional_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::task::{Category, TaskPriority, TaskQueue, Weight};
use crate::domain::models::{
    Counter, Execution, ExecutionStatus, Metric, Mode, Notification, NotificationSource, Operator,
    Trigger, TriggerAction, TriggerCondition, TriggerType,
};
use crate::domain::models::ids::TaskID;
use crate::domain::ports::database::ExecutionStats;
use crate::domain::ports::Database;

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn trigger_type_str(t: TriggerType) -> &'static str {
    match t {
        TriggerType::Count => "count",
        TriggerType::Initiative => "initiative",
        TriggerType::Event => "event",
        TriggerType::Threshold => "threshold",
        TriggerType::Schedule => "schedule",
    }
}

fn parse_trigger_type(s: &str) -> DomainResult<TriggerType> {
    match s {
        "count" => Ok(TriggerType::Count),
        "initiative" => Ok(TriggerType::Initiative),
        "event" => Ok(TriggerType::Event),
        "threshold" => Ok(TriggerType::Threshold),
        "schedule" => Ok(TriggerType::Schedule),
        other => Err(DomainError::Serialization(format!("unknown trigger_type '{other}'"))),
    }
}

fn mode_str(m: Mode) -> &'static str {
    match m {
        Mode::Auto => "auto",
        Mode::Approval => "approval",
        Mode::Notify => "notify",
    }
}

fn parse_mode(s: &str) -> DomainResult<Mode> {
    match s {
        "auto" => Ok(Mode::Auto),
        "approval" => Ok(Mode::Approval),
        "notify" => Ok(Mode::Notify),
        other => Err(DomainError::Serialization(format!("unknown mode '{other}'"))),
    }
}

fn operator_str(op: Operator) -> &'static str {
    match op {
        Operator::Lt => "<",
        Operator::Gt => ">",
        Operator::Eq => "=",
        Operator::Le => "<=",
        Operator::Ge => ">=",
    }
}

fn priority_str(p: TaskPriority) -> &'static str {
    match p {
        TaskPriority::Critical => "critical",
        TaskPriority::High => "high",
        TaskPriority::Normal => "normal",
        TaskPriority::Low => "low",
    }
}

fn parse_priority(s: &str) -> DomainResult<TaskPriority> {
    match s {
        "critical" => Ok(TaskPriority::Critical),
        "high" => Ok(TaskPriority::High),
        "normal" => Ok(TaskPriority::Normal),
        "low" => Ok(TaskPriority::Low),
        other => Err(DomainError::Serialization(format!("unknown priority '{other}'"))),
    }
}

fn queue_str(q: TaskQueue) -> &'static str {
    match q {
        TaskQueue::Active => "active",
        TaskQueue::Backlog => "backlog",
    }
}

fn parse_queue(s: &str) -> DomainResult<TaskQueue> {
    match s {
        "active" => Ok(TaskQueue::Active),
        "backlog" => Ok(TaskQueue::Backlog),
        other => Err(DomainError::Serialization(format!("unknown queue '{other}'"))),
    }
}

fn condition_to_json(condition: &TriggerCondition) -> serde_json::Value {
    match condition {
        TriggerCondition::Count { metric, threshold, weight_filter, category_filter } => json!({
            "kind": "count",
            "metric": metric,
            "threshold": threshold,
            "weight_filter": weight_filter,
            "category_filter": category_filter,
        }),
        TriggerCondition::EventMatch { event_name, filter } => json!({
            "kind": "event_match",
            "event_name": event_name,
            "filter": filter,
        }),
        TriggerCondition::Threshold { metric, operator, value } => json!({
            "kind": "threshold",
            "metric": metric,
            "operator": operator_str(*operator),
            "value": value,
        }),
        TriggerCondition::Schedule { cron_expr } => json!({
            "kind": "schedule",
            "cron_expr": cron_expr,
        }),
    }
}

fn condition_from_json(raw: &str) -> DomainResult<TriggerCondition> {
    let v: serde_json::Value = serde_json::from_str(raw)?;
    let kind = v.get("kind").and_then(|k| k.as_str()).ok_or_else(|| {
        DomainError::Serialization("condition_data missing 'kind'".to_string())
    })?;
    match kind {
        "count" => Ok(TriggerCondition::Count {
            metric: field_str(&v, "metric")?,
            threshold: v.get("threshold").and_then(|t| t.as_i64()).ok_or_else(|| {
                DomainError::Serialization("count condition missing threshold".to_string())
            })?,
            weight_filter: v
                .get("weight_filter")
                .cloned()
                .map(serde_json::from_value::<Weight>)
                .transpose()?,
            category_filter: v
                .get("category_filter")
                .cloned()
                .map(serde_json::from_value::<Category>)
                .transpose()?,
        }),
        "event_match" => Ok(TriggerCondition::EventMatch {
            event_name: field_str(&v, "event_name")?,
            filter: v
                .get("filter")
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .unwrap_or_default(),
        }),
        "threshold" => Ok(TriggerCondition::Threshold {
            metric: field_str(&v, "metric")?,
            operator: v
                .get("operator")
                .and_then(|o| o.as_str())
                .and_then(Operator::parse)
                .ok_or_else(|| DomainError::Serialization("invalid threshold operator".to_string()))?,
            value: v.get("value").and_then(|x| x.as_f64()).ok_or_else(|| {
                DomainError::Serialization("threshold condition missing value".to_string())
            })?,
        }),
        "schedule" => Ok(TriggerCondition::Schedule { cron_expr: field_str(&v, "cron_expr")? }),
        other => Err(DomainError::Serialization(format!("unknown condition kind '{other}'"))),
    }
}

fn field_str(v: &serde_json::Value, key: &str) -> DomainResult<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| DomainError::Serialization(format!("condition_data missing '{key}'")))
}

fn row_to_trigger(
    id: String,
    trigger_type: String,
    enabled: i64,
    mode: String,
    condition_data: String,
    action_template: String,
    action_priority: String,
    action_queue: String,
    cooldown_tasks: Option<i64>,
    cooldown_duration_secs: Option<i64>,
    trigger_count: i64,
    last_triggered_at: Option<String>,
) -> DomainResult<Trigger> {
    Ok(Trigger {
        id: parse_uuid(&id)?,
        trigger_type: parse_trigger_type(&trigger_type)?,
        enabled: enabled != 0,
        mode: parse_mode(&mode)?,
        condition: condition_from_json(&condition_data)?,
        action: TriggerAction {
            template: action_template,
            priority: parse_priority(&action_priority)?,
            queue: parse_queue(&action_queue)?,
        },
        cooldown: crate::domain::models::Cooldown {
            tasks: cooldown_tasks.map(|t| t as u32),
            duration: cooldown_duration_secs.map(chrono::Duration::seconds),
        },
        trigger_count: trigger_count as u64,
        last_triggered_at: last_triggered_at.map(|s| parse_datetime(&s)).transpose()?,
    })
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn save_trigger(&self, trigger: &Trigger) -> DomainResult<()> {
        let condition_data = condition_to_json(&trigger.condition).to_string();
        sqlx::query(
            "INSERT INTO triggers (
                id, trigger_type, enabled, mode, condition_data,
                action_template, action_priority, action_queue,
                cooldown_tasks, cooldown_duration_secs, trigger_count, last_triggered_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                trigger_type = excluded.trigger_type,
                enabled = excluded.enabled,
                mode = excluded.mode,
                condition_data = excluded.condition_data,
                action_template = excluded.action_template,
                action_priority = excluded.action_priority,
                action_queue = excluded.action_queue,
                cooldown_tasks = excluded.cooldown_tasks,
                cooldown_duration_secs = excluded.cooldown_duration_secs,
                trigger_count = excluded.trigger_count,
                last_triggered_at = excluded.last_triggered_at",
        )
        .bind(trigger.id.to_string())
        .bind(trigger_type_str(trigger.trigger_type))
        .bind(trigger.enabled as i64)
        .bind(mode_str(trigger.mode))
        .bind(condition_data)
        .bind(&trigger.action.template)
        .bind(priority_str(trigger.action.priority))
        .bind(queue_str(trigger.action.queue))
        .bind(trigger.cooldown.tasks.map(|t| t as i64))
        .bind(trigger.cooldown.duration.map(|d| d.num_seconds()))
        .bind(trigger.trigger_count as i64)
        .bind(trigger.last_triggered_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_trigger(&self, id: Uuid) -> DomainResult<Option<Trigger>> {
        let row = sqlx::query("SELECT * FROM triggers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            None => Ok(None),
            Some(row) => Ok(Some(row_to_trigger(
                row.try_get("id")?,
                row.try_get("trigger_type")?,
                row.try_get("enabled")?,
                row.try_get("mode")?,
                row.try_get("condition_data")?,
                row.try_get("action_template")?,
                row.try_get("action_priority")?,
                row.try_get("action_queue")?,
                row.try_get("cooldown_tasks")?,
                row.try_get("cooldown_duration_secs")?,
                row.try_get("trigger_count")?,
                row.try_get("last_triggered_at")?,
            )?)),
        }
    }

    async fn load_all_triggers(&self) -> DomainResult<Vec<Trigger>> {
        let rows = sqlx::query("SELECT * FROM triggers").fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                row_to_trigger(
                    row.try_get("id")?,
                    row.try_get("trigger_type")?,
                    row.try_get("enabled")?,
                    row.try_get("mode")?,
                    row.try_get("condition_data")?,
                    row.try_get("action_template")?,
                    row.try_get("action_priority")?,
                    row.try_get("action_queue")?,
                    row.try_get("cooldown_tasks")?,
                    row.try_get("cooldown_duration_secs")?,
                    row.try_get("trigger_count")?,
                    row.try_get("last_triggered_at")?,
                )
            })
            .collect()
    }

    async fn increment_trigger_count(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<u64> {
        let row = sqlx::query(
            "UPDATE triggers SET trigger_count = trigger_count + 1, last_triggered_at = ?
             WHERE id = ? RETURNING trigger_count",
        )
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(row.try_get::<i64, _>("trigger_count")? as u64),
            None => Err(DomainError::TriggerNotFound(id)),
        }
    }

    async fn set_trigger_enabled(&self, id: Uuid, enabled: bool) -> DomainResult<()> {
        let result = sqlx::query("UPDATE triggers SET enabled = ? WHERE id = ?")
            .bind(enabled as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::TriggerNotFound(id));
        }
        Ok(())
    }

    async fn get_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<Option<Counter>> {
        let row = sqlx::query("SELECT * FROM counters WHERE trigger_id = ? AND metric = ?")
            .bind(trigger_id.to_string())
            .bind(metric)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            None => Ok(None),
            Some(row) => Ok(Some(Counter {
                trigger_id: parse_uuid(&row.try_get::<String, _>("trigger_id")?)?,
                metric: row.try_get("metric")?,
                count: row.try_get("count")?,
                last_reset_at: parse_datetime(&row.try_get::<String, _>("last_reset_at")?)?,
            })),
        }
    }

    async fn increment_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<()> {
        self.increment_and_get_counter(trigger_id, metric).await?;
        Ok(())
    }

    async fn increment_and_get_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<i64> {
        let row = sqlx::query(
            "INSERT INTO counters (trigger_id, metric, count) VALUES (?, ?, 1)
             ON CONFLICT(trigger_id, metric) DO UPDATE SET count = count + 1
             RETURNING count",
        )
        .bind(trigger_id.to_string())
        .bind(metric)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("count")?)
    }

    async fn reset_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO counters (trigger_id, metric, count, last_reset_at)
             VALUES (?, ?, 0, datetime('now'))
             ON CONFLICT(trigger_id, metric) DO UPDATE SET count = 0, last_reset_at = excluded.last_reset_at",
        )
        .bind(trigger_id.to_string())
        .bind(metric)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_execution(&self, execution: &Execution) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO executions (id, trigger_id, task_id, triggered_at, reason, status, completed_at, error_message)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(execution.id.to_string())
        .bind(execution.trigger_id.to_string())
        .bind(execution.task_id.as_ref().map(|t| t.as_str().to_string()))
        .bind(execution.triggered_at.to_rfc3339())
        .bind(&execution.reason)
        .bind(execution_status_str(execution.status))
        .bind(execution.completed_at.map(|t| t.to_rfc3339()))
        .bind(&execution.error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_execution_status(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        error_message: Option<String>,
    ) -> DomainResult<()> {
        let completed_at = Execution::is_terminal(status).then(|| Utc::now().to_rfc3339());
        sqlx::query(
            "UPDATE executions SET status = ?, completed_at = COALESCE(?, completed_at), error_message = ?
             WHERE id = ?",
        )
        .bind(execution_status_str(status))
        .bind(completed_at)
        .bind(error_message)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_recent_executions(&self, limit: usize) -> DomainResult<Vec<Execution>> {
        let rows = sqlx::query("SELECT * FROM executions ORDER BY triggered_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let task_id: Option<String> = row.try_get("task_id")?;
                Ok(Execution {
                    id: parse_uuid(&row.try_get::<String, _>("id")?)?,
                    trigger_id: parse_uuid(&row.try_get::<String, _>("trigger_id")?)?,
                    task_id: task_id.map(TaskID::new_unchecked),
                    triggered_at: parse_datetime(&row.try_get::<String, _>("triggered_at")?)?,
                    reason: row.try_get("reason")?,
                    status: parse_execution_status(&row.try_get::<String, _>("status")?)?,
                    completed_at: parse_optional_datetime(row.try_get("completed_at")?)?,
                    error_message: row.try_get("error_message")?,
                })
            })
            .collect()
    }

    async fn record_metric(&self, metric: &Metric) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO metrics (id, name, value, task_id, recorded_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(metric.id.to_string())
        .bind(&metric.name)
        .bind(metric.value)
        .bind(metric.task_id.as_ref().map(|t| t.as_str().to_string()))
        .bind(metric.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_latest_metric(&self, name: &str) -> DomainResult<Option<Metric>> {
        let row = sqlx::query(
            "SELECT * FROM metrics WHERE name = ? ORDER BY recorded_at DESC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            None => Ok(None),
            Some(row) => {
                let task_id: Option<String> = row.try_get("task_id")?;
                Ok(Some(Metric {
                    id: parse_uuid(&row.try_get::<String, _>("id")?)?,
                    name: row.try_get("name")?,
                    value: row.try_get("value")?,
                    task_id: task_id.map(TaskID::new_unchecked),
                    recorded_at: parse_datetime(&row.try_get::<String, _>("recorded_at")?)?,
                }))
            }
        }
    }

    async fn create_notification(&self, notification: &Notification) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO notifications (
                id, notification_type, title, message, source_type, source_id,
                dismissed, created_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(notification.id.to_string())
        .bind(&notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification_source_str(notification.source_type))
        .bind(&notification.source_id)
        .bind(notification.dismissed as i64)
        .bind(notification.created_at.to_rfc3339())
        .bind(notification.expires_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_active_notifications(&self) -> DomainResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE dismissed = 0 ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(Notification {
                    id: parse_uuid(&row.try_get::<String, _>("id")?)?,
                    notification_type: row.try_get("notification_type")?,
                    title: row.try_get("title")?,
                    message: row.try_get("message")?,
                    source_type: parse_notification_source(&row.try_get::<String, _>("source_type")?)?,
                    source_id: row.try_get("source_id")?,
                    dismissed: row.try_get::<i64, _>("dismissed")? != 0,
                    created_at: parse_datetime(&row.try_get::<String, _>("created_at")?)?,
                    expires_at: parse_optional_datetime(row.try_get("expires_at")?)?,
                })
            })
            .collect()
    }

    async fn dismiss_notification(&self, id: Uuid) -> DomainResult<()> {
        sqlx::query("UPDATE notifications SET dismissed = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn dismiss_all_notifications(&self) -> DomainResult<()> {
        sqlx::query("UPDATE notifications SET dismissed = 1 WHERE dismissed = 0")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_execution_stats(&self) -> DomainResult<ExecutionStats> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) AS total,
                SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) AS completed,
                SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END) AS failed,
                SUM(CASE WHEN status = 'skipped' THEN 1 ELSE 0 END) AS skipped,
                SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END) AS pending
             FROM executions",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(ExecutionStats {
            total: row.try_get::<i64, _>("total")? as u64,
            completed: row.try_get::<Option<i64>, _>("completed")?.unwrap_or(0) as u64,
            failed: row.try_get::<Option<i64>, _>("failed")?.unwrap_or(0) as u64,
            skipped: row.try_get::<Option<i64>, _>("skipped")?.unwrap_or(0) as u64,
            pending: row.try_get::<Option<i64>, _>("pending")?.unwrap_or(0) as u64,
        })
    }
}

fn execution_status_str(s: ExecutionStatus) -> &'static str {
    match s {
        ExecutionStatus::Pending => "pending",
        ExecutionStatus::Running => "running",
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::Skipped => "skipped",
    }
}

fn parse_execution_status(s: &str) -> DomainResult<ExecutionStatus> {
    match s {
        "pending" => Ok(ExecutionStatus::Pending),
        "running" => Ok(ExecutionStatus::Running),
        "completed" => Ok(ExecutionStatus::Completed),
        "failed" => Ok(ExecutionStatus::Failed),
        "skipped" => Ok(ExecutionStatus::Skipped),
        other => Err(DomainError::Serialization(format!("unknown execution status '{other}'"))),
    }
}

fn notification_source_str(s: NotificationSource) -> &'static str {
    match s {
        NotificationSource::Trigger => "trigger",
        NotificationSource::Task => "task",
    }
}

fn parse_notification_source(s: &str) -> DomainResult<NotificationSource> {
    match s {
        "trigger" => Ok(NotificationSource::Trigger),
        "task" => Ok(NotificationSource::Task),
        other => Err(DomainError::Serialization(format!("unknown notification source '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::Cooldown;

    async fn test_db() -> SqliteDatabase {
        SqliteDatabase::new(create_migrated_test_pool().await.unwrap())
    }

    fn sample_trigger() -> Trigger {
        Trigger::new(
            TriggerType::Count,
            Mode::Auto,
            TriggerCondition::Count {
                metric: "tasks_completed".to_string(),
                threshold: 5,
                weight_filter: None,
                category_filter: None,
            },
            TriggerAction {
                template: "cleanup".to_string(),
                priority: TaskPriority::Normal,
                queue: TaskQueue::Active,
            },
            Cooldown::default(),
        )
    }

    #[tokio::test]
    async fn save_and_load_trigger_round_trips() {
        let db = test_db().await;
        let trigger = sample_trigger();
        db.save_trigger(&trigger).await.unwrap();
        let loaded = db.load_trigger(trigger.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, trigger.id);
        assert!(matches!(loaded.trigger_type, TriggerType::Count));
        match loaded.condition {
            TriggerCondition::Count { threshold, .. } => assert_eq!(threshold, 5),
            _ => panic!("wrong condition kind"),
        }
    }

    #[tokio::test]
    async fn increment_and_get_counter_is_atomic_single_round_trip() {
        let db = test_db().await;
        let trigger_id = Uuid::new_v4();
        let mut handles = Vec::new();
        let db = std::sync::Arc::new(db);
        for _ in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.increment_and_get_counter(trigger_id, "tasks_completed").await.unwrap()
            }));
        }
        let mut results: Vec<i64> = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }
        results.sort_unstable();
        assert_eq!(results, (1..=10).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn increment_trigger_count_returns_post_increment_value() {
        let db = test_db().await;
        let trigger = sample_trigger();
        db.save_trigger(&trigger).await.unwrap();
        let n1 = db.increment_trigger_count(trigger.id, Utc::now()).await.unwrap();
        let n2 = db.increment_trigger_count(trigger.id, Utc::now()).await.unwrap();
        assert_eq!(n1, 1);
        assert_eq!(n2, 2);
    }

    #[tokio::test]
    async fn reset_counter_zeroes_existing_count() {
        let db = test_db().await;
        let trigger_id = Uuid::new_v4();
        db.increment_and_get_counter(trigger_id, "m").await.unwrap();
        db.increment_and_get_counter(trigger_id, "m").await.unwrap();
        db.reset_counter(trigger_id, "m").await.unwrap();
        let counter = db.get_counter(trigger_id, "m").await.unwrap().unwrap();
        assert_eq!(counter.count, 0);
    }
}
