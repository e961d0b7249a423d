//! Default `PlanGenerator`: maps a task's weight to a fixed phase
//! template. Heavier weights get more phases; lighter weights collapse
//! several concerns into one phase.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Phase, Weight};
use crate::domain::ports::PlanGenerator;

pub struct StandardPlanGenerator;

impl StandardPlanGenerator {
    fn phase_ids(weight: Weight) -> &'static [&'static str] {
        match weight {
            Weight::Trivial => &["implement"],
            Weight::Small => &["implement", "review"],
            Weight::Medium => &["design", "implement", "review"],
            Weight::Large => &["design", "implement", "test", "review"],
            Weight::Greenfield => &["design", "implement", "test", "review", "release"],
        }
    }
}

#[async_trait]
impl PlanGenerator for StandardPlanGenerator {
    async fn generate(&self, weight: Weight) -> DomainResult<Vec<Phase>> {
        Ok(Self::phase_ids(weight)
            .iter()
            .map(|id| Phase::new(*id, "sentinel file removed"))
            .collect())
    }
}
