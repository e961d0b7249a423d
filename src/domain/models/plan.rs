//! Plan and Phase domain models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    /// Human-readable description of what signals this phase as done.
    pub completion_predicate: String,
    pub status: PhaseStatus,
}

impl Phase {
    pub fn new(id: impl Into<String>, completion_predicate: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            completion_predicate: completion_predicate.into(),
            status: PhaseStatus::Pending,
        }
    }
}

/// Ordered sequence of phases for a task. Regenerable from weight: building
/// a fresh plan for a new weight preserves the status of any phase ID that
/// exists in both the old and new sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub phases: Vec<Phase>,
}

impl Plan {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// The phase execution should work on next, or `None` if the plan is exhausted.
    pub fn current_phase(&self) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|p| p.status == PhaseStatus::Pending)
    }

    pub fn mark_completed(&mut self, phase_id: &str) {
        if let Some(p) = self.phases.iter_mut().find(|p| p.id == phase_id) {
            p.status = PhaseStatus::Completed;
        }
    }

    /// Replace this plan's phases with a freshly generated sequence,
    /// carrying over the status of any phase ID present in both.
    pub fn regenerate(&mut self, new_phases: Vec<Phase>) {
        let mut new_phases = new_phases;
        for phase in &mut new_phases {
            if let Some(old) = self.phases.iter().find(|p| p.id == phase.id) {
                phase.status = old.status;
            }
        }
        self.phases = new_phases;
    }
}
