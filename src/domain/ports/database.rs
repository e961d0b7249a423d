//! Persistence port consumed by the automation engine.
//!
//! The core treats this as an opaque interface; the required atomicity
//! (counter upsert, trigger-count increment) is a contract obligation on
//! implementations, not something the trait signature can enforce.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Counter, Execution, ExecutionStatus, Metric, Notification, Trigger};

/// Aggregate statistics over recent executions, as surfaced by `GetStats`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub pending: u64,
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn save_trigger(&self, trigger: &Trigger) -> DomainResult<()>;
    async fn load_trigger(&self, id: Uuid) -> DomainResult<Option<Trigger>>;
    async fn load_all_triggers(&self) -> DomainResult<Vec<Trigger>>;

    /// Atomically increments and returns the trigger's persisted fire count.
    async fn increment_trigger_count(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<u64>;

    async fn set_trigger_enabled(&self, id: Uuid, enabled: bool) -> DomainResult<()>;

    async fn get_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<Option<Counter>>;
    async fn increment_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<()>;

    /// Single round-trip upsert: insert count=1 if absent, else count+1,
    /// returning the post-increment value. The lynchpin of Count-evaluator
    /// correctness; see the module-level contract note.
    async fn increment_and_get_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<i64>;

    async fn reset_counter(&self, trigger_id: Uuid, metric: &str) -> DomainResult<()>;

    async fn create_execution(&self, execution: &Execution) -> DomainResult<()>;
    async fn update_execution_status(
        &self,
        id: Uuid,
        status: ExecutionStatus,
        error_message: Option<String>,
    ) -> DomainResult<()>;
    async fn get_recent_executions(&self, limit: usize) -> DomainResult<Vec<Execution>>;

    async fn record_metric(&self, metric: &Metric) -> DomainResult<()>;
    async fn get_latest_metric(&self, name: &str) -> DomainResult<Option<Metric>>;

    async fn create_notification(&self, notification: &Notification) -> DomainResult<()>;
    async fn get_active_notifications(&self) -> DomainResult<Vec<Notification>>;
    async fn dismiss_notification(&self, id: Uuid) -> DomainResult<()>;
    async fn dismiss_all_notifications(&self) -> DomainResult<()>;

    async fn get_execution_stats(&self) -> DomainResult<ExecutionStats>;
}
