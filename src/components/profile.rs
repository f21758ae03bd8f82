use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::rules::query::{RewardFilters, TaskFilters};

/// Stable chat identity of a user, independent of the ECS entity index.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Per-emblem wallet. Every code in the catalog registry is seeded to zero so
/// a typo in a code reads as zero instead of silently growing the key set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    amounts: BTreeMap<String, i64>,
}

impl Balances {
    pub fn seeded<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            amounts: codes.into_iter().map(|code| (code.into(), 0)).collect(),
        }
    }

    pub fn get(&self, code: &str) -> i64 {
        self.amounts.get(code).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, code: &str, amount: i64) {
        if amount <= 0 {
            return;
        }
        *self.amounts.entry(code.to_string()).or_insert(0) += amount;
    }

    /// Debit clamped at zero. Callers guard with an affordability check first;
    /// the clamp keeps the non-negative invariant even if they do not.
    pub fn debit(&mut self, code: &str, amount: i64) {
        if amount <= 0 {
            return;
        }
        let entry = self.amounts.entry(code.to_string()).or_insert(0);
        *entry = (*entry - amount).max(0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.amounts.iter().map(|(code, amount)| (code.as_str(), *amount))
    }
}

/// What free-text input the bot is waiting for from this user, if anything.
/// At most one mode is active; submitting or cancelling returns to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Idle,
    AwaitingTaskSearch,
    AwaitingRewardSearch,
}

/// Which list a submitted search query applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Tasks,
    Rewards,
}

/// Mutable per-user economy state. Created lazily on first interaction.
///
/// `level` is derived from `experience` by the progression rules and is never
/// written by anything else.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Ledger {
    pub balances: Balances,
    pub experience: i64,
    pub level: u32,
    pub task_filters: TaskFilters,
    pub reward_filters: RewardFilters,
    pub search: SearchMode,
}

impl Ledger {
    pub fn new<I, S>(currency_codes: I, starting_level: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            balances: Balances::seeded(currency_codes),
            experience: 0,
            level: starting_level,
            task_filters: TaskFilters::default(),
            reward_filters: RewardFilters::default(),
            search: SearchMode::Idle,
        }
    }

    pub fn reset_task_filters(&mut self) {
        self.task_filters = TaskFilters::default();
    }

    pub fn reset_reward_filters(&mut self) {
        self.reward_filters = RewardFilters::default();
    }

    pub fn begin_task_search(&mut self) {
        self.search = SearchMode::AwaitingTaskSearch;
    }

    pub fn begin_reward_search(&mut self) {
        self.search = SearchMode::AwaitingRewardSearch;
    }

    pub fn cancel_search(&mut self) {
        self.search = SearchMode::Idle;
    }

    /// Resolve a pending search mode, returning which list the query targets.
    /// A submission with no pending mode is ignored by the caller.
    pub fn take_search(&mut self) -> Option<SearchTarget> {
        let target = match self.search {
            SearchMode::Idle => None,
            SearchMode::AwaitingTaskSearch => Some(SearchTarget::Tasks),
            SearchMode::AwaitingRewardSearch => Some(SearchTarget::Rewards),
        };
        self.search = SearchMode::Idle;
        target
    }
}

/// Append-only record of completed task ids. Collaborator data: the economy
/// rules never consult it, so completion stays unconditionally repeatable.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskHistory(pub Vec<String>);

impl TaskHistory {
    pub fn record(&mut self, task_id: &str) {
        self.0.push(task_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_codes_read_zero() {
        let balances = Balances::seeded(["FIN", "HEART"]);
        assert_eq!(balances.get("FIN"), 0);
        assert_eq!(balances.get("HEART"), 0);
        assert_eq!(balances.get("UNKNOWN"), 0);
    }

    #[test]
    fn credit_and_debit_round_trip() {
        let mut balances = Balances::default();
        balances.credit("FIN", 5);
        balances.debit("FIN", 2);
        assert_eq!(balances.get("FIN"), 3);
    }

    #[test]
    fn debit_floors_at_zero() {
        let mut balances = Balances::seeded(["FIN"]);
        balances.credit("FIN", 1);
        balances.debit("FIN", 10);
        assert_eq!(balances.get("FIN"), 0);
    }

    #[test]
    fn non_positive_amounts_are_ignored() {
        let mut balances = Balances::seeded(["FIN"]);
        balances.credit("FIN", 0);
        balances.credit("FIN", -3);
        balances.debit("FIN", -3);
        assert_eq!(balances.get("FIN"), 0);
    }

    #[test]
    fn search_mode_is_exclusive_and_one_shot() {
        let mut ledger = Ledger::new(["FIN"], 1);
        assert_eq!(ledger.take_search(), None);

        ledger.begin_task_search();
        ledger.begin_reward_search();
        assert_eq!(ledger.take_search(), Some(SearchTarget::Rewards));
        assert_eq!(ledger.search, SearchMode::Idle);
        assert_eq!(ledger.take_search(), None);
    }

    #[test]
    fn cancel_clears_pending_search() {
        let mut ledger = Ledger::new(["FIN"], 1);
        ledger.begin_task_search();
        ledger.cancel_search();
        assert_eq!(ledger.take_search(), None);
    }

    #[test]
    fn filter_reset_restores_defaults() {
        let mut ledger = Ledger::new(["FIN"], 1);
        ledger.task_filters.category = Some("dog".to_string());
        ledger.reward_filters.affordable_only = true;
        ledger.reset_task_filters();
        ledger.reset_reward_filters();
        assert_eq!(ledger.task_filters, TaskFilters::default());
        assert_eq!(ledger.reward_filters, RewardFilters::default());
    }
}
