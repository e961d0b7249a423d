//! Schedule evaluator: passive from the event-driven path. A separate
//! cron-driven caller invokes `AutomationEngine::run_trigger` directly on
//! ticks; `HandleEvent` never fires a schedule trigger.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Event, Trigger, TriggerType};
use crate::domain::ports::Database;

use super::{Evaluator, Verdict};

pub struct ScheduleEvaluator;

#[async_trait]
impl Evaluator for ScheduleEvaluator {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::Schedule
    }

    async fn evaluate(&self, _trigger: &Trigger, _event: &Event, _db: &dyn Database) -> DomainResult<Verdict> {
        Ok(Verdict::skip())
    }
}
