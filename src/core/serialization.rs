use std::fs;
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::profile::{Balances, Ledger, TaskHistory, UserId};
use crate::rules::progression::ProgressionConfig;
use crate::rules::query::{RewardFilters, TaskFilters};
use crate::simulation::catalog::Catalog;
use crate::simulation::season::SeasonClock;

/// Save state capturing the season clock and every user ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    #[serde(default = "default_save_version")]
    pub version: u32,
    #[serde(default)]
    pub season: SeasonClock,
    pub users: Vec<SavedUser>,
}

fn default_save_version() -> u32 {
    1
}

/// One user's durable state. Search mode is interaction-transient and is
/// deliberately absent; loaded users start idle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedUser {
    pub user_id: i64,
    pub experience: i64,
    pub level: u32,
    #[serde(default)]
    pub balances: Balances,
    #[serde(default)]
    pub task_filters: TaskFilters,
    #[serde(default)]
    pub reward_filters: RewardFilters,
    #[serde(default)]
    pub completed: Vec<String>,
}

/// Extract a serializable snapshot of every ledger in the world.
pub fn extract_state_from_world(world: &World) -> SaveState {
    let season = world
        .get_resource::<SeasonClock>()
        .cloned()
        .unwrap_or_default();

    let mut users: Vec<SavedUser> = world
        .iter_entities()
        .filter_map(|entity_ref| {
            let user_id = entity_ref.get::<UserId>()?.0;
            let ledger = entity_ref.get::<Ledger>()?;
            let completed = entity_ref
                .get::<TaskHistory>()
                .map(|history| history.0.clone())
                .unwrap_or_default();
            Some(SavedUser {
                user_id,
                experience: ledger.experience,
                level: ledger.level,
                balances: ledger.balances.clone(),
                task_filters: ledger.task_filters.clone(),
                reward_filters: ledger.reward_filters.clone(),
                completed,
            })
        })
        .collect();
    users.sort_by_key(|user| user.user_id);

    SaveState {
        version: default_save_version(),
        season,
        users,
    }
}

/// Apply a saved snapshot back into the world, replacing every existing
/// ledger. Balances are reseeded against the live catalog registry so codes
/// added since the save still read as zero.
pub fn apply_state_to_world(state: SaveState, world: &mut World) {
    if let Some(mut season) = world.get_resource_mut::<SeasonClock>() {
        *season = state.season.clone();
    } else {
        world.insert_resource(state.season.clone());
    }

    let existing: Vec<Entity> = {
        let mut query = world.query_filtered::<Entity, With<UserId>>();
        query.iter(world).collect()
    };
    for entity in existing {
        let _ = world.despawn(entity);
    }

    let config = *world.resource::<ProgressionConfig>();
    let codes: Vec<String> = world
        .resource::<Catalog>()
        .currency_codes()
        .iter()
        .cloned()
        .collect();

    for saved in state.users {
        let mut ledger = Ledger::new(codes.iter().cloned(), config.curve.starting_level());
        ledger.experience = saved.experience;
        ledger.level = saved.level.min(config.max_level);
        for (code, amount) in saved.balances.iter() {
            ledger.balances.credit(code, amount);
        }
        ledger.task_filters = saved.task_filters;
        ledger.reward_filters = saved.reward_filters;
        world.spawn((
            UserId(saved.user_id),
            ledger,
            TaskHistory(saved.completed),
        ));
    }
}

/// Serialize a save state into JSON for persistence.
pub fn save_state_to_json(state: &SaveState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}

/// Deserialize JSON back into a save state.
pub fn load_state_from_json(data: &str) -> serde_json::Result<SaveState> {
    serde_json::from_str(data)
}

/// Write a save state to a file path.
pub fn save_state_to_path<P: AsRef<Path>>(state: &SaveState, path: P) -> std::io::Result<()> {
    let json = save_state_to_json(state)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Read a save state from a file path.
pub fn load_state_from_path<P: AsRef<Path>>(path: P) -> std::io::Result<SaveState> {
    let data = fs::read_to_string(&path)?;
    load_state_from_json(&data).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}
