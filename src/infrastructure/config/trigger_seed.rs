//! Converts declarative `TriggerDef` configuration entries into domain
//! `Trigger`s for database seeding at startup.

use std::collections::HashMap;

use thiserror::Error;

use crate::automation::cooldown;
use crate::domain::models::config::TriggerDef;
use crate::domain::models::{
    Category, Cooldown, Operator, TaskPriority, TaskQueue, Trigger, TriggerAction, TriggerCondition, TriggerType,
    Weight,
};

#[derive(Error, Debug)]
pub enum TriggerSeedError {
    #[error("trigger #{0}: unknown trigger_type {1:?}")]
    UnknownTriggerType(usize, String),
    #[error("trigger #{0}: unknown mode {1:?}")]
    UnknownMode(usize, String),
    #[error("trigger #{0}: unknown operator {1:?}")]
    UnknownOperator(usize, String),
    #[error("trigger #{0}: unknown priority {1:?}")]
    UnknownPriority(usize, String),
    #[error("trigger #{0}: unknown queue {1:?}")]
    UnknownQueue(usize, String),
    #[error("trigger #{0}: unknown weight filter {1:?}")]
    UnknownWeight(usize, String),
    #[error("trigger #{0}: unknown category filter {1:?}")]
    UnknownCategory(usize, String),
    #[error("trigger #{0}: invalid cooldown: {1}")]
    InvalidCooldown(usize, crate::domain::errors::DomainError),
}

fn parse_mode(i: usize, s: &str) -> Result<crate::domain::models::Mode, TriggerSeedError> {
    use crate::domain::models::Mode;
    match s {
        "auto" => Ok(Mode::Auto),
        "approval" => Ok(Mode::Approval),
        "notify" => Ok(Mode::Notify),
        other => Err(TriggerSeedError::UnknownMode(i, other.to_string())),
    }
}

fn parse_priority(i: usize, s: &str) -> Result<TaskPriority, TriggerSeedError> {
    match s {
        "" | "normal" => Ok(TaskPriority::Normal),
        "critical" => Ok(TaskPriority::Critical),
        "high" => Ok(TaskPriority::High),
        "low" => Ok(TaskPriority::Low),
        other => Err(TriggerSeedError::UnknownPriority(i, other.to_string())),
    }
}

fn parse_queue(i: usize, s: &str) -> Result<TaskQueue, TriggerSeedError> {
    match s {
        "" | "active" => Ok(TaskQueue::Active),
        "backlog" => Ok(TaskQueue::Backlog),
        other => Err(TriggerSeedError::UnknownQueue(i, other.to_string())),
    }
}

fn parse_weight(i: usize, s: &str) -> Result<Weight, TriggerSeedError> {
    match s {
        "trivial" => Ok(Weight::Trivial),
        "small" => Ok(Weight::Small),
        "medium" => Ok(Weight::Medium),
        "large" => Ok(Weight::Large),
        "greenfield" => Ok(Weight::Greenfield),
        other => Err(TriggerSeedError::UnknownWeight(i, other.to_string())),
    }
}

fn parse_category(i: usize, s: &str) -> Result<Category, TriggerSeedError> {
    match s {
        "feature" => Ok(Category::Feature),
        "bug" => Ok(Category::Bug),
        "refactor" => Ok(Category::Refactor),
        "chore" => Ok(Category::Chore),
        "docs" => Ok(Category::Docs),
        "test" => Ok(Category::Test),
        other => Err(TriggerSeedError::UnknownCategory(i, other.to_string())),
    }
}

/// `filter` entries `weight` / `category` are pulled out as typed filters;
/// everything else is folded into `TriggerCondition::EventMatch::filter`
/// verbatim (string equality match against event metadata).
fn event_filter(filter: &HashMap<String, String>) -> HashMap<String, String> {
    filter
        .iter()
        .filter(|(k, _)| k.as_str() != "weight" && k.as_str() != "category")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn condition_for(i: usize, def: &TriggerDef, trigger_type: TriggerType) -> Result<TriggerCondition, TriggerSeedError> {
    match trigger_type {
        TriggerType::Count => Ok(TriggerCondition::Count {
            metric: def.metric.clone(),
            threshold: def.threshold,
            weight_filter: def.filter.get("weight").map(|w| parse_weight(i, w)).transpose()?,
            category_filter: def.filter.get("category").map(|c| parse_category(i, c)).transpose()?,
        }),
        TriggerType::Initiative | TriggerType::Event => Ok(TriggerCondition::EventMatch {
            event_name: def.event_name.clone(),
            filter: event_filter(&def.filter),
        }),
        TriggerType::Threshold => Ok(TriggerCondition::Threshold {
            metric: def.metric.clone(),
            operator: Operator::parse(&def.operator)
                .ok_or_else(|| TriggerSeedError::UnknownOperator(i, def.operator.clone()))?,
            value: def.threshold as f64,
        }),
        TriggerType::Schedule => Ok(TriggerCondition::Schedule { cron_expr: def.cron_expr.clone() }),
    }
}

/// Converts one configuration entry into a freshly-identified `Trigger`
/// (a new random UUID, zero trigger_count, never-triggered).
pub fn from_config(i: usize, def: &TriggerDef) -> Result<Trigger, TriggerSeedError> {
    let trigger_type = match def.trigger_type.as_str() {
        "count" => TriggerType::Count,
        "initiative" => TriggerType::Initiative,
        "event" => TriggerType::Event,
        "threshold" => TriggerType::Threshold,
        "schedule" => TriggerType::Schedule,
        other => return Err(TriggerSeedError::UnknownTriggerType(i, other.to_string())),
    };

    let condition = condition_for(i, def, trigger_type)?;
    let mode = parse_mode(i, &def.mode)?;
    let cooldown = match &def.cooldown {
        Some(spec) => cooldown::parse(spec).map_err(|e| TriggerSeedError::InvalidCooldown(i, e))?,
        None => Cooldown::default(),
    };

    Ok(Trigger::new(
        trigger_type,
        mode,
        condition,
        TriggerAction {
            template: def.template.clone(),
            priority: parse_priority(i, &def.priority)?,
            queue: parse_queue(i, &def.queue)?,
        },
        cooldown,
    ))
}

/// Converts every entry in `defs`, short-circuiting on the first error.
pub fn from_config_all(defs: &[TriggerDef]) -> Result<Vec<Trigger>, TriggerSeedError> {
    defs.iter().enumerate().map(|(i, d)| from_config(i, d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_def() -> TriggerDef {
        TriggerDef {
            trigger_type: "count".to_string(),
            mode: "auto".to_string(),
            template: "Review recently completed large tasks".to_string(),
            priority: "high".to_string(),
            queue: String::new(),
            metric: "large_tasks_completed".to_string(),
            threshold: 3,
            operator: String::new(),
            event_name: String::new(),
            filter: HashMap::from([("weight".to_string(), "large".to_string())]),
            cron_expr: String::new(),
            cooldown: None,
        }
    }

    #[test]
    fn converts_count_trigger() {
        let trigger = from_config(0, &count_def()).unwrap();
        assert!(matches!(trigger.trigger_type, TriggerType::Count));
        assert!(matches!(trigger.action.priority, TaskPriority::High));
        match trigger.condition {
            TriggerCondition::Count { threshold, weight_filter, .. } => {
                assert_eq!(threshold, 3);
                assert_eq!(weight_filter, Some(Weight::Large));
            }
            _ => panic!("expected Count condition"),
        }
    }

    #[test]
    fn unknown_trigger_type_is_rejected() {
        let mut def = count_def();
        def.trigger_type = "bogus".to_string();
        assert!(matches!(from_config(0, &def), Err(TriggerSeedError::UnknownTriggerType(0, _))));
    }

    #[test]
    fn threshold_trigger_parses_operator() {
        let def = TriggerDef {
            trigger_type: "threshold".to_string(),
            mode: "notify".to_string(),
            operator: ">=".to_string(),
            metric: "queue_depth".to_string(),
            threshold: 10,
            ..count_def()
        };
        let trigger = from_config(0, &def).unwrap();
        match trigger.condition {
            TriggerCondition::Threshold { operator, value, .. } => {
                assert!(matches!(operator, Operator::Ge));
                assert_eq!(value, 10.0);
            }
            _ => panic!("expected Threshold condition"),
        }
    }
}
