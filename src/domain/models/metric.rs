//! Metric domain model.

use super::ids::TaskID;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Metric {
    pub id: Uuid,
    pub name: String,
    pub value: f64,
    pub task_id: Option<TaskID>,
    pub recorded_at: DateTime<Utc>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, task_id: Option<TaskID>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            value,
            task_id,
            recorded_at: Utc::now(),
        }
    }
}
