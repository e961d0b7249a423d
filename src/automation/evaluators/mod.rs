//! Evaluator registry: polymorphic over `{Type(), Evaluate(trigger, event, db)}`.
//! New trigger types are added by registering another variant; nothing
//! else in the automation engine changes.

mod count;
mod event;
mod initiative;
mod schedule;
mod threshold;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Event as BusEvent, Trigger, TriggerType};
use crate::domain::ports::Database;

/// Outcome of evaluating one trigger against one event.
pub struct Verdict {
    pub should_fire: bool,
    pub reason: String,
}

impl Verdict {
    pub fn fire(reason: impl Into<String>) -> Self {
        Self { should_fire: true, reason: reason.into() }
    }

    pub fn skip() -> Self {
        Self { should_fire: false, reason: String::new() }
    }
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    fn trigger_type(&self) -> TriggerType;

    async fn evaluate(&self, trigger: &Trigger, event: &BusEvent, db: &dyn Database) -> DomainResult<Verdict>;
}

/// True iff every key in `filter` is present in `metadata` with an equal value.
pub(crate) fn metadata_matches(filter: &std::collections::HashMap<String, String>, metadata: &std::collections::HashMap<String, String>) -> bool {
    filter.iter().all(|(k, v)| metadata.get(k) == Some(v))
}

/// Builds the default registry of built-in evaluators, keyed by the
/// `TriggerType` each one handles.
pub fn default_registry() -> HashMap<TriggerType, Arc<dyn Evaluator>> {
    let evaluators: Vec<Arc<dyn Evaluator>> = vec![
        Arc::new(count::CountEvaluator),
        Arc::new(initiative::InitiativeEvaluator),
        Arc::new(event::EventEvaluator),
        Arc::new(threshold::ThresholdEvaluator),
        Arc::new(schedule::ScheduleEvaluator),
    ];
    evaluators.into_iter().map(|e| (e.trigger_type(), e)).collect()
}
