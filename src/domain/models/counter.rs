//! Counter domain model — keyed by (trigger_id, metric); mutated only by
//! the persistence layer's atomic increment-and-return or reset.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Counter {
    pub trigger_id: Uuid,
    pub metric: String,
    pub count: i64,
    pub last_reset_at: DateTime<Utc>,
}

impl Counter {
    /// Reserved metric name for the per-trigger cooldown counter. Distinct
    /// from whatever metric name a Count-type trigger itself uses, to
    /// avoid the silent collision noted in the design notes.
    pub const COOLDOWN_METRIC: &'static str = "__cooldown__";
}
