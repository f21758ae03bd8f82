use bevy_ecs::prelude::*;

use crate::components::profile::{Ledger, SearchTarget, UserId};
use crate::core::world::{ActionIntent, ActionQueue};

/// Apply filter, sort, pagination and search-mode intents to the addressed
/// ledger. These are pure preference transitions; the catalog is not
/// consulted and nothing in the economy changes.
pub fn browse_system(intents: Res<ActionQueue>, mut users: Query<(&UserId, &mut Ledger)>) {
    for intent in intents.0.iter() {
        let Some(user_id) = intent.user_id() else {
            continue;
        };
        let Some((_, mut ledger)) = users.iter_mut().find(|(id, _)| id.0 == user_id) else {
            continue;
        };

        match intent {
            ActionIntent::SetTaskCategory { category, .. } => {
                ledger.task_filters.category = category.clone();
                ledger.task_filters.page = 0;
            }
            ActionIntent::SetTaskEmblem { emblem, .. } => {
                ledger.task_filters.emblem = emblem.clone();
                ledger.task_filters.page = 0;
            }
            ActionIntent::ToggleTaskSort { .. } => {
                ledger.task_filters.sort = ledger.task_filters.sort.toggled();
            }
            ActionIntent::SetTaskPage { page, .. } => {
                ledger.task_filters.page = *page;
            }
            ActionIntent::ResetTaskFilters { .. } => ledger.reset_task_filters(),
            ActionIntent::SetRewardCategory { category, .. } => {
                ledger.reward_filters.category = category.clone();
                ledger.reward_filters.page = 0;
            }
            ActionIntent::ToggleRewardSort { .. } => {
                ledger.reward_filters.sort = ledger.reward_filters.sort.toggled();
            }
            ActionIntent::ToggleAffordableOnly { .. } => {
                ledger.reward_filters.affordable_only = !ledger.reward_filters.affordable_only;
                ledger.reward_filters.page = 0;
            }
            ActionIntent::SetRewardPage { page, .. } => {
                ledger.reward_filters.page = *page;
            }
            ActionIntent::ResetRewardFilters { .. } => ledger.reset_reward_filters(),
            ActionIntent::BeginTaskSearch { .. } => ledger.begin_task_search(),
            ActionIntent::BeginRewardSearch { .. } => ledger.begin_reward_search(),
            ActionIntent::CancelSearch { .. } => ledger.cancel_search(),
            ActionIntent::SubmitSearch { query, .. } => {
                let query = query.trim();
                let stored = if query.is_empty() {
                    None
                } else {
                    Some(query.to_string())
                };
                match ledger.take_search() {
                    Some(SearchTarget::Tasks) => {
                        ledger.task_filters.query = stored;
                        ledger.task_filters.page = 0;
                    }
                    Some(SearchTarget::Rewards) => {
                        ledger.reward_filters.query = stored;
                        ledger.reward_filters.page = 0;
                    }
                    // Stray text with no pending search mode is dropped.
                    None => {}
                }
            }
            _ => {}
        }
    }
}
