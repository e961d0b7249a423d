//! Trigger domain model: condition/action sum types, modes, cooldowns.

use super::task::{Category, TaskPriority, TaskQueue, Weight};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    Count,
    Initiative,
    Event,
    Threshold,
    Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Auto,
    Approval,
    Notify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Gt,
    Eq,
    Le,
    Ge,
}

impl Operator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "=" => Some(Self::Eq),
            "<=" | "≤" => Some(Self::Le),
            ">=" | "≥" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// Condition shape, keyed by `TriggerType`. `Initiative` and `Event` share
/// the `EventMatch` shape; the `Event` evaluator additionally parses a
/// `weights` key out of `filter` as a comma-separated list.
#[derive(Debug, Clone)]
pub enum TriggerCondition {
    Count {
        metric: String,
        threshold: i64,
        weight_filter: Option<Weight>,
        category_filter: Option<Category>,
    },
    EventMatch {
        event_name: String,
        filter: HashMap<String, String>,
    },
    Threshold {
        metric: String,
        operator: Operator,
        value: f64,
    },
    Schedule {
        cron_expr: String,
    },
}

#[derive(Debug, Clone)]
pub struct TriggerAction {
    pub template: String,
    pub priority: TaskPriority,
    pub queue: TaskQueue,
}

/// A trigger fires only once both legs of its cooldown, when configured,
/// are satisfied — see `automation::cooldown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cooldown {
    pub tasks: Option<u32>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: Uuid,
    pub trigger_type: TriggerType,
    pub enabled: bool,
    pub mode: Mode,
    pub condition: TriggerCondition,
    pub action: TriggerAction,
    pub cooldown: Cooldown,
    pub trigger_count: u64,
    pub last_triggered_at: Option<DateTime<Utc>>,
}

impl Trigger {
    pub fn new(
        trigger_type: TriggerType,
        mode: Mode,
        condition: TriggerCondition,
        action: TriggerAction,
        cooldown: Cooldown,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_type,
            enabled: true,
            mode,
            condition,
            action,
            cooldown,
            trigger_count: 0,
            last_triggered_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_parsing_and_apply() {
        assert!(Operator::parse("<").unwrap().apply(1.0, 2.0));
        assert!(Operator::parse(">=").unwrap().apply(2.0, 2.0));
        assert!(Operator::parse("=").unwrap().apply(2.0, 2.0));
        assert!(Operator::parse("bogus").is_none());
    }
}
