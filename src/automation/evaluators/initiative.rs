//! Initiative evaluator: exact event-type match, then `condition.filter`
//! must be a subset of `event.metadata`.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Event, Trigger, TriggerCondition, TriggerType};
use crate::domain::ports::Database;

use super::{metadata_matches, Evaluator, Verdict};

pub struct InitiativeEvaluator;

#[async_trait]
impl Evaluator for InitiativeEvaluator {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::Initiative
    }

    async fn evaluate(&self, trigger: &Trigger, event: &Event, _db: &dyn Database) -> DomainResult<Verdict> {
        let TriggerCondition::EventMatch { event_name, filter } = &trigger.condition else {
            return Ok(Verdict::skip());
        };

        if &event.event_type != event_name {
            return Ok(Verdict::skip());
        }
        if !metadata_matches(filter, &event.metadata) {
            return Ok(Verdict::skip());
        }

        Ok(Verdict::fire(format!("initiative event '{event_name}' matched")))
    }
}
