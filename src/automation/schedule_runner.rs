//! Drives `Schedule`-type triggers, which the event-driven `handle_event`
//! path never fires (see `evaluators::schedule`). Polls on a fixed tick,
//! and for every enabled schedule trigger whose cron expression matched a
//! point in time since the last tick, calls `run_trigger` directly.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tokio::sync::{watch, Mutex};
use tracing::warn;
use uuid::Uuid;

use crate::automation::AutomationEngine;
use crate::domain::models::TriggerType;
use crate::domain::ports::Database;

const TICK_INTERVAL: Duration = Duration::from_secs(60);

pub struct ScheduleRunner {
    engine: Arc<AutomationEngine>,
    db: Arc<dyn Database>,
    last_checked: Mutex<chrono::DateTime<Utc>>,
}

impl ScheduleRunner {
    pub fn new(engine: Arc<AutomationEngine>, db: Arc<dyn Database>) -> Self {
        Self { engine, db, last_checked: Mutex::new(Utc::now()) }
    }

    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = interval.tick() => self.tick().await,
            }
        }
    }

    async fn tick(&self) {
        let now = Utc::now();
        let since = {
            let mut last = self.last_checked.lock().await;
            let since = *last;
            *last = now;
            since
        };

        let triggers = match self.db.load_all_triggers().await {
            Ok(t) => t,
            Err(err) => {
                warn!(%err, "schedule runner failed to load triggers");
                return;
            }
        };

        let mut cron_exprs: HashMap<Uuid, String> = HashMap::new();
        for trigger in &triggers {
            if trigger.trigger_type != TriggerType::Schedule || !trigger.enabled {
                continue;
            }
            if let crate::domain::models::TriggerCondition::Schedule { cron_expr } = &trigger.condition {
                cron_exprs.insert(trigger.id, cron_expr.clone());
            }
        }

        for (id, expr) in cron_exprs {
            let schedule = match Schedule::from_str(&expr) {
                Ok(s) => s,
                Err(err) => {
                    warn!(trigger_id = %id, %err, "invalid cron expression, skipping");
                    continue;
                }
            };
            let due = schedule.after(&since).take_while(|t| *t <= now).count() > 0;
            if !due {
                continue;
            }
            if let Err(err) = self.engine.run_trigger(id).await {
                warn!(trigger_id = %id, %err, "scheduled trigger failed to fire");
            }
        }
    }
}
