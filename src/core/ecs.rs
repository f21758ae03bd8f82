use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;

use crate::core::world::ActionQueue;
use crate::rules::progression::ProgressionConfig;
use crate::simulation::catalog::Catalog;
use crate::simulation::season::SeasonClock;
use crate::systems::browse::browse_system;
use crate::systems::economy::{economy_system, EconomyEventLog, NotificationOutbox};
use crate::systems::season::season_system;

/// Canonical tick ordering for one batch of interactions.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickSet {
    Intake,
    Simulation,
    Time,
    Cleanup,
}

/// Build the ECS world with baseline resources and the season content.
pub fn create_world(catalog: Catalog, config: ProgressionConfig) -> World {
    let mut world = World::new();
    world.insert_resource(ActionQueue::default());
    world.insert_resource(EconomyEventLog::default());
    world.insert_resource(NotificationOutbox::default());
    world.insert_resource(SeasonClock::default());
    world.insert_resource(config);
    world.insert_resource(catalog);
    world
}

/// Build the system schedule in the canonical order. Browse preferences are
/// applied before economy operations so a filter change and a completion in
/// the same batch behave like two sequential chat actions.
pub fn create_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets(
        (TickSet::Intake, TickSet::Simulation, TickSet::Time, TickSet::Cleanup).chain(),
    );

    schedule.add_systems((
        browse_system.in_set(TickSet::Intake),
        economy_system.in_set(TickSet::Simulation),
        season_system.in_set(TickSet::Time),
    ));

    schedule
}
