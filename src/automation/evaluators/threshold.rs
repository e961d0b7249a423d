//! Threshold evaluator: fires after a task/phase completion if the latest
//! recorded metric satisfies the configured operator.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{event_type, Event, Trigger, TriggerCondition, TriggerType};
use crate::domain::ports::Database;

use super::{Evaluator, Verdict};

pub struct ThresholdEvaluator;

#[async_trait]
impl Evaluator for ThresholdEvaluator {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::Threshold
    }

    async fn evaluate(&self, trigger: &Trigger, event: &Event, db: &dyn Database) -> DomainResult<Verdict> {
        let TriggerCondition::Threshold { metric, operator, value } = &trigger.condition else {
            return Ok(Verdict::skip());
        };

        if event.event_type != event_type::TASK_COMPLETED && event.event_type != event_type::PHASE_COMPLETED {
            return Ok(Verdict::skip());
        }

        let Some(latest) = db.get_latest_metric(metric).await? else {
            return Ok(Verdict::skip());
        };

        if operator.apply(latest.value, *value) {
            Ok(Verdict::fire(format!("{metric} = {} satisfies condition against {value}", latest.value)))
        } else {
            Ok(Verdict::skip())
        }
    }
}
