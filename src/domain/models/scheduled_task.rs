//! Scheduler queue entry.

use super::ids::TaskID;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Integer scheduling priority. Ordered: urgent fires before default fires
/// before background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub u32);

impl Priority {
    pub const BACKGROUND: Priority = Priority(10);
    pub const DEFAULT: Priority = Priority(100);
    pub const URGENT: Priority = Priority(1000);
}

/// A queue entry: everything the scheduler needs to decide readiness and order.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub id: TaskID,
    pub title: String,
    pub priority: Priority,
    pub depends_on: HashSet<TaskID>,
    pub created_at: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn new(
        id: TaskID,
        title: impl Into<String>,
        priority: Priority,
        depends_on: HashSet<TaskID>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            priority,
            depends_on,
            created_at: Utc::now(),
        }
    }

    /// Total order for the queue: higher priority first, ties broken by
    /// earlier `created_at`.
    pub fn order_key(&self) -> (std::cmp::Reverse<Priority>, DateTime<Utc>) {
        (std::cmp::Reverse(self.priority), self.created_at)
    }
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// `BinaryHeap` is a max-heap; we want the *lowest* `order_key` (highest
/// priority, earliest created_at) to sort first, so comparison is reversed.
impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.order_key().cmp(&self.order_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn task(id: &str, priority: Priority) -> ScheduledTask {
        ScheduledTask::new(TaskID::parse(id).unwrap(), id, priority, HashSet::new())
    }

    #[test]
    fn higher_priority_pops_first() {
        let mut heap = BinaryHeap::new();
        heap.push(task("TASK-001", Priority::BACKGROUND));
        heap.push(task("TASK-002", Priority::URGENT));
        heap.push(task("TASK-003", Priority::DEFAULT));

        assert_eq!(heap.pop().unwrap().id.as_str(), "TASK-002");
        assert_eq!(heap.pop().unwrap().id.as_str(), "TASK-003");
        assert_eq!(heap.pop().unwrap().id.as_str(), "TASK-001");
    }

    #[test]
    fn ties_broken_by_earlier_created_at() {
        let mut first = task("TASK-001", Priority::DEFAULT);
        let mut second = task("TASK-002", Priority::DEFAULT);
        first.created_at = Utc::now() - chrono::Duration::seconds(5);
        second.created_at = Utc::now();

        let mut heap = BinaryHeap::new();
        heap.push(second);
        heap.push(first);
        assert_eq!(heap.pop().unwrap().id.as_str(), "TASK-001");
    }
}
