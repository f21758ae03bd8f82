use std::path::Path;

use bevy_ecs::prelude::*;

use crate::components::profile::{Balances, Ledger, TaskHistory, UserId};
use crate::core::ecs::{create_schedule, create_world};
use crate::core::serialization::{
    apply_state_to_world, extract_state_from_world, load_state_from_path, save_state_to_path,
    SaveState,
};
use crate::data::rewards::Reward;
use crate::data::tasks::Task;
use crate::rules::progression::{ProgressSummary, ProgressionConfig};
use crate::rules::query::{filter_rewards, filter_tasks, paginate, Page};
use crate::simulation::catalog::Catalog;
use crate::simulation::economy::progress_summary;
use crate::simulation::season::SeasonClock;
use crate::systems::economy::{EconomyEvent, EconomyEventLog, Notification, NotificationOutbox};

/// Intent-driven commands fed into the ECS each tick. The presentation layer
/// maps raw interaction payloads onto these.
#[derive(Debug, Clone)]
pub enum ActionIntent {
    CompleteTask { user_id: i64, task_id: String },
    RedeemReward { user_id: i64, reward_id: String },
    SetTaskCategory { user_id: i64, category: Option<String> },
    SetTaskEmblem { user_id: i64, emblem: Option<String> },
    ToggleTaskSort { user_id: i64 },
    SetTaskPage { user_id: i64, page: usize },
    ResetTaskFilters { user_id: i64 },
    SetRewardCategory { user_id: i64, category: Option<String> },
    ToggleRewardSort { user_id: i64 },
    ToggleAffordableOnly { user_id: i64 },
    SetRewardPage { user_id: i64, page: usize },
    ResetRewardFilters { user_id: i64 },
    BeginTaskSearch { user_id: i64 },
    BeginRewardSearch { user_id: i64 },
    SubmitSearch { user_id: i64, query: String },
    CancelSearch { user_id: i64 },
    AdvanceDay,
}

impl ActionIntent {
    /// The user this intent addresses, if any.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            ActionIntent::CompleteTask { user_id, .. }
            | ActionIntent::RedeemReward { user_id, .. }
            | ActionIntent::SetTaskCategory { user_id, .. }
            | ActionIntent::SetTaskEmblem { user_id, .. }
            | ActionIntent::ToggleTaskSort { user_id }
            | ActionIntent::SetTaskPage { user_id, .. }
            | ActionIntent::ResetTaskFilters { user_id }
            | ActionIntent::SetRewardCategory { user_id, .. }
            | ActionIntent::ToggleRewardSort { user_id }
            | ActionIntent::ToggleAffordableOnly { user_id }
            | ActionIntent::SetRewardPage { user_id, .. }
            | ActionIntent::ResetRewardFilters { user_id }
            | ActionIntent::BeginTaskSearch { user_id }
            | ActionIntent::BeginRewardSearch { user_id }
            | ActionIntent::SubmitSearch { user_id, .. }
            | ActionIntent::CancelSearch { user_id } => Some(*user_id),
            ActionIntent::AdvanceDay => None,
        }
    }
}

/// Resource storing the intents for the next tick.
#[derive(Resource, Default, Debug)]
pub struct ActionQueue(pub Vec<ActionIntent>);

/// Data snapshot returned to the presentation layer after each tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub season: String,
    pub users: Vec<UserSummary>,
    pub events: Vec<EconomyEvent>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone)]
pub struct UserSummary {
    pub user_id: i64,
    pub level: u32,
    pub experience: i64,
    pub balances: Balances,
}

/// Wrapper around the ECS world and schedule. The only mutable surface of
/// the engine; callers are expected to serialize ticks per process.
pub struct Engine {
    world: World,
    schedule: Schedule,
}

impl Engine {
    /// Create an engine over a validated catalog and progression config.
    pub fn new(catalog: Catalog, config: ProgressionConfig) -> Self {
        let world = create_world(catalog, config);
        let schedule = create_schedule();
        Self { world, schedule }
    }

    /// Run one batch of interactions and return a snapshot for rendering.
    /// Ledgers for unseen user ids are created before the systems run.
    pub fn tick(&mut self, intents: Vec<ActionIntent>) -> Snapshot {
        for user_id in intents.iter().filter_map(ActionIntent::user_id) {
            get_or_create_user(&mut self.world, user_id);
        }
        {
            let mut queue = self.world.resource_mut::<ActionQueue>();
            queue.0 = intents;
        }

        self.schedule.run(&mut self.world);
        Snapshot::capture(&self.world)
    }

    /// Spawn the user's ledger if this identity has never been seen.
    pub fn get_or_create(&mut self, user_id: i64) -> Entity {
        get_or_create_user(&mut self.world, user_id)
    }

    /// The user's task list under their stored filters, one page.
    pub fn browse_tasks(&mut self, user_id: i64) -> Page<Task> {
        let entity = self.get_or_create(user_id);
        let ledger = self
            .world
            .get::<Ledger>(entity)
            .expect("user entity always carries a ledger");
        let catalog = self.world.resource::<Catalog>();
        let filtered: Vec<Task> = filter_tasks(&catalog.tasks, &ledger.task_filters)
            .into_iter()
            .cloned()
            .collect();
        paginate(&filtered, ledger.task_filters.page)
    }

    /// The user's shop under their stored filters, one page.
    pub fn browse_rewards(&mut self, user_id: i64) -> Page<Reward> {
        let entity = self.get_or_create(user_id);
        let ledger = self
            .world
            .get::<Ledger>(entity)
            .expect("user entity always carries a ledger");
        let catalog = self.world.resource::<Catalog>();
        let filtered: Vec<Reward> =
            filter_rewards(&catalog.rewards, &ledger.reward_filters, &ledger.balances)
                .into_iter()
                .cloned()
                .collect();
        paginate(&filtered, ledger.reward_filters.page)
    }

    /// Battle-pass position of one user.
    pub fn progress(&mut self, user_id: i64) -> ProgressSummary {
        let entity = self.get_or_create(user_id);
        let config = *self.world.resource::<ProgressionConfig>();
        let ledger = self
            .world
            .get::<Ledger>(entity)
            .expect("user entity always carries a ledger");
        progress_summary(ledger, &config)
    }

    /// Current wallet of one user.
    pub fn balances(&mut self, user_id: i64) -> Balances {
        let entity = self.get_or_create(user_id);
        self.world
            .get::<Ledger>(entity)
            .expect("user entity always carries a ledger")
            .balances
            .clone()
    }

    pub fn catalog(&self) -> &Catalog {
        self.world.resource::<Catalog>()
    }

    pub fn season(&self) -> &SeasonClock {
        self.world.resource::<SeasonClock>()
    }

    /// Extract a serializable save state from the current world.
    pub fn save_state(&self) -> SaveState {
        extract_state_from_world(&self.world)
    }

    /// Apply a saved state back into the live world.
    pub fn load_state(&mut self, state: SaveState) {
        apply_state_to_world(state, &mut self.world);
    }

    /// Save state directly to a file path.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        save_state_to_path(&self.save_state(), path)
    }

    /// Load state directly from a file path.
    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> std::io::Result<()> {
        let state = load_state_from_path(path)?;
        self.load_state(state);
        Ok(())
    }
}

/// Find the entity holding a user's ledger, spawning it with zeroed balances
/// and default filters on first sight.
pub fn get_or_create_user(world: &mut World, user_id: i64) -> Entity {
    let mut query = world.query::<(Entity, &UserId)>();
    if let Some((entity, _)) = query.iter(world).find(|(_, id)| id.0 == user_id) {
        return entity;
    }

    let starting_level = world
        .resource::<ProgressionConfig>()
        .curve
        .starting_level();
    let codes: Vec<String> = world
        .resource::<Catalog>()
        .currency_codes()
        .iter()
        .cloned()
        .collect();
    world
        .spawn((
            UserId(user_id),
            Ledger::new(codes, starting_level),
            TaskHistory::default(),
        ))
        .id()
}

impl Snapshot {
    fn capture(world: &World) -> Self {
        let season = world.resource::<SeasonClock>().label();

        let mut users: Vec<UserSummary> = world
            .iter_entities()
            .filter_map(|entity_ref| {
                let user_id = entity_ref.get::<UserId>()?.0;
                let ledger = entity_ref.get::<Ledger>()?;
                Some(UserSummary {
                    user_id,
                    level: ledger.level,
                    experience: ledger.experience,
                    balances: ledger.balances.clone(),
                })
            })
            .collect();
        users.sort_by_key(|summary| summary.user_id);

        let events = world
            .get_resource::<EconomyEventLog>()
            .map(|log| log.0.clone())
            .unwrap_or_default();
        let notifications = world
            .get_resource::<NotificationOutbox>()
            .map(|outbox| outbox.0.clone())
            .unwrap_or_default();

        Snapshot {
            season,
            users,
            events,
            notifications,
        }
    }
}
