//! Event bus payload.

use super::ids::TaskID;
use super::task::{Category, Weight};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Canonical event type strings. Consumers match on these rather than an
/// enum so that new types can be introduced without a breaking change to
/// the wire/bus contract.
pub mod event_type {
    pub const TASK_COMPLETED: &str = "task_completed";
    pub const TASK_FAILED: &str = "task_failed";
    pub const PHASE_COMPLETED: &str = "phase_completed";
    pub const PHASE_FAILED: &str = "phase_failed";
    pub const PR_MERGED: &str = "pr_merged";
    pub const PR_APPROVED: &str = "pr_approved";
    pub const INITIATIVE_COMPLETED: &str = "initiative_completed";
    pub const INITIATIVE_STARTED: &str = "initiative_started";
}

#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub task_id: Option<TaskID>,
    pub weight: Option<Weight>,
    pub category: Option<Category>,
    pub phase: Option<String>,
    pub metadata: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            task_id: None,
            weight: None,
            category: None,
            phase: None,
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_task(mut self, task_id: TaskID) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
