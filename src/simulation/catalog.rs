use std::collections::BTreeSet;

use bevy_ecs::prelude::*;

use crate::data::battle_pass::BattlePassCatalog;
use crate::data::rewards::Reward;
use crate::data::tasks::Task;
use crate::data::CatalogDataError;

/// Read-only content for one season: tasks, shop rewards, battle-pass tiers,
/// and the currency registry derived from all three.
#[derive(Resource, Debug, Clone)]
pub struct Catalog {
    pub tasks: Vec<Task>,
    pub rewards: Vec<Reward>,
    pub pass: BattlePassCatalog,
    currencies: BTreeSet<String>,
}

impl Catalog {
    /// Combine the three loaded catalogs, deriving the currency registry and
    /// checking cross-catalog rules (tier levels must fit under the season
    /// cap). The per-file `validate` checks are assumed to have run already.
    pub fn assemble(
        tasks: Vec<Task>,
        rewards: Vec<Reward>,
        pass: BattlePassCatalog,
        max_level: u32,
    ) -> Result<Self, CatalogDataError> {
        for tier in &pass.tiers {
            if tier.level > max_level {
                return Err(CatalogDataError::Validation(format!(
                    "tier {} is above the season cap {}",
                    tier.level, max_level
                )));
            }
        }

        let mut currencies = BTreeSet::new();
        for task in &tasks {
            currencies.extend(task.emblems.keys().cloned());
        }
        for reward in &rewards {
            currencies.extend(reward.cost.keys().cloned());
        }
        for tier in &pass.tiers {
            currencies.extend(tier.emblems.keys().cloned());
        }

        Ok(Self {
            tasks,
            rewards,
            pass,
            currencies,
        })
    }

    /// Every emblem code mentioned anywhere in the catalog, sorted.
    pub fn currency_codes(&self) -> &BTreeSet<String> {
        &self.currencies
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn reward(&self, id: &str) -> Option<&Reward> {
        self.rewards.iter().find(|reward| reward.id == id)
    }

    /// Distinct task categories in catalog order, for category menus.
    pub fn task_categories(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.tasks
            .iter()
            .filter(|task| seen.insert(task.category.as_str()))
            .map(|task| task.category.as_str())
            .collect()
    }

    pub fn reward_categories(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.rewards
            .iter()
            .filter(|reward| seen.insert(reward.category.as_str()))
            .map(|reward| reward.category.as_str())
            .collect()
    }
}
