//! Task domain model.
//!
//! The core only needs a thin sliver of a task's full record: identifier,
//! weight (which drives plan regeneration), and status. Everything else
//! (description, branch name, queue membership) rides along for the
//! persistence and watcher layers but carries no scheduling logic.

use super::ids::TaskID;
use serde::{Deserialize, Serialize};

/// Ordinal weight — ordering matters: `Trivial < Small < Medium < Large < Greenfield`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    Trivial,
    Small,
    Medium,
    Large,
    Greenfield,
}

impl Weight {
    /// Weight classes the Count evaluator treats as "large" for the
    /// `large_tasks_completed` metric.
    pub fn is_large(self) -> bool {
        matches!(self, Weight::Large | Weight::Greenfield)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Feature,
    Bug,
    Refactor,
    Chore,
    Docs,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Critical,
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskQueue {
    Active,
    Backlog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Created,
    Planned,
    Running,
    Paused,
    Completed,
    Failed,
    Blocked,
}

/// A task as the core sees it — identifier, weight, status, plus the
/// attributes that persistence and the watcher round-trip but the
/// scheduler/worker never inspect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskID,
    pub title: String,
    pub description: String,
    pub weight: Weight,
    pub category: Category,
    pub priority: TaskPriority,
    pub queue: TaskQueue,
    pub status: TaskStatus,
    pub branch_name: String,
    pub is_automation: bool,
}

impl Task {
    pub fn new(id: TaskID, title: impl Into<String>, weight: Weight, category: Category) -> Self {
        let is_automation = id.is_automation();
        Self {
            id,
            title: title.into(),
            description: String::new(),
            weight,
            category,
            priority: TaskPriority::Normal,
            queue: TaskQueue::Active,
            status: TaskStatus::Created,
            branch_name: String::new(),
            is_automation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_ordering() {
        assert!(Weight::Trivial < Weight::Small);
        assert!(Weight::Large < Weight::Greenfield);
    }

    #[test]
    fn is_large_classification() {
        assert!(Weight::Large.is_large());
        assert!(Weight::Greenfield.is_large());
        assert!(!Weight::Medium.is_large());
    }

    #[test]
    fn automation_flag_derived_from_id() {
        let t = Task::new(
            TaskID::parse("AUTO-001").unwrap(),
            "synth",
            Weight::Small,
            Category::Chore,
        );
        assert!(t.is_automation);
    }
}
