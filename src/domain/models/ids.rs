//! Externally-assigned string identities.
//!
//! Unlike the engine-owned entities (`Trigger`, `Counter`, ...) which carry
//! `Uuid` identities, a `Task` is assigned its ID by whatever created it —
//! a human, a CLI command, or the automation engine's `AUTO-NNN` allocator.
//! The core treats it as an opaque, pattern-validated string.

use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task identifier, e.g. `TASK-001` or `AUTO-003`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskID(String);

impl TaskID {
    /// Validate and wrap a raw string. Accepts `TASK-*` and `AUTO-*`.
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.starts_with("TASK-") || raw.starts_with("AUTO-") {
            Ok(Self(raw))
        } else {
            Err(DomainError::InvalidId(raw, "must start with TASK- or AUTO-"))
        }
    }

    /// Construct without validation, for identifiers already known-valid
    /// (e.g. round-tripped from storage).
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn is_automation(&self) -> bool {
        self.0.starts_with("AUTO-")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TaskID> for String {
    fn from(id: TaskID) -> Self {
        id.0
    }
}

/// Worker identifier; one worker exists per running task, so it is derived
/// directly from the `TaskID` it serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerID(String);

impl WorkerID {
    pub fn for_task(task_id: &TaskID) -> Self {
        Self(task_id.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
