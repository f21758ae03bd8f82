use bevy_ecs::prelude::*;

use crate::core::world::{ActionIntent, ActionQueue};
use crate::simulation::season::SeasonClock;

/// System: advances the season clock, one day per explicit intent.
pub fn season_system(intents: Res<ActionQueue>, mut clock: ResMut<SeasonClock>) {
    for intent in intents.0.iter() {
        if matches!(intent, ActionIntent::AdvanceDay) {
            clock.advance_day();
        }
    }
}
