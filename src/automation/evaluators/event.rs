//! Event evaluator: like Initiative, plus a `weights` filter key parsed as a
//! comma-separated list and matched against the event's weight.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Event as BusEvent, Trigger, TriggerCondition, TriggerType, Weight};
use crate::domain::ports::Database;

use super::{metadata_matches, Evaluator, Verdict};

pub struct EventEvaluator;

#[async_trait]
impl Evaluator for EventEvaluator {
    fn trigger_type(&self) -> TriggerType {
        TriggerType::Event
    }

    async fn evaluate(&self, trigger: &Trigger, event: &BusEvent, _db: &dyn Database) -> DomainResult<Verdict> {
        let TriggerCondition::EventMatch { event_name, filter } = &trigger.condition else {
            return Ok(Verdict::skip());
        };

        if &event.event_type != event_name {
            return Ok(Verdict::skip());
        }

        if let Some(weights) = filter.get("weights") {
            let allowed: Vec<&str> = weights.split(',').map(str::trim).collect();
            let matches = event
                .weight
                .map(|w| allowed.iter().any(|a| weight_name(w) == *a))
                .unwrap_or(false);
            if !matches {
                return Ok(Verdict::skip());
            }
        }

        let rest: std::collections::HashMap<String, String> =
            filter.iter().filter(|(k, _)| k.as_str() != "weights").map(|(k, v)| (k.clone(), v.clone())).collect();
        if !metadata_matches(&rest, &event.metadata) {
            return Ok(Verdict::skip());
        }

        Ok(Verdict::fire(format!("event '{event_name}' matched")))
    }
}

fn weight_name(w: Weight) -> &'static str {
    match w {
        Weight::Trivial => "trivial",
        Weight::Small => "small",
        Weight::Medium => "medium",
        Weight::Large => "large",
        Weight::Greenfield => "greenfield",
    }
}
