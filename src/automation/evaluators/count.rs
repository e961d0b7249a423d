//! Count evaluator: fires once an atomically-incremented counter crosses
//! its configured threshold, then resets it.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{event_type, Event, Trigger, TriggerCondition, TriggerType};
use crate::domain::ports::Database;

use super::{Evaluator, Verdict};

pub struct CountEvaluator;

#[async_trait]
impl Evaluator for CountEvaluator {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::Count
    }

    async fn evaluate(&self, trigger: &Trigger, event: &Event, db: &dyn Database) -> DomainResult<Verdict> {
        let TriggerCondition::Count { metric, threshold, weight_filter, category_filter } = &trigger.condition else {
            return Ok(Verdict::skip());
        };

        if event.event_type != event_type::TASK_COMPLETED && event.event_type != event_type::PHASE_COMPLETED {
            return Ok(Verdict::skip());
        }

        if let Some(w) = weight_filter {
            if event.weight != Some(*w) {
                return Ok(Verdict::skip());
            }
        }
        if let Some(c) = category_filter {
            if event.category != Some(*c) {
                return Ok(Verdict::skip());
            }
        }

        let derived_metric = if event.event_type == event_type::PHASE_COMPLETED {
            "phases_completed"
        } else if event.weight.map(|w| w.is_large()).unwrap_or(false) {
            "large_tasks_completed"
        } else {
            "tasks_completed"
        };

        if metric != derived_metric {
            return Ok(Verdict::skip());
        }

        let count = db.increment_and_get_counter(trigger.id, metric).await?;
        if count >= *threshold {
            db.reset_counter(trigger.id, metric).await?;
            return Ok(Verdict::fire(format!("{metric} reached {count} (threshold {threshold})")));
        }

        Ok(Verdict::skip())
    }
}
