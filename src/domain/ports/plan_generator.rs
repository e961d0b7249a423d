//! PlanGenerator port — builds a fresh phase sequence for a task's weight.
//! Consumed by the Watcher's weight-change side effect; the resulting
//! phases are folded into the existing plan via `Plan::regenerate`, which
//! preserves the status of any overlapping phase ID.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Phase, Weight};

#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, weight: Weight) -> DomainResult<Vec<Phase>>;
}
