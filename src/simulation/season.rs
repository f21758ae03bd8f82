use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Global resource tracking the running season.
///
/// Days advance only on an explicit intent from the presentation layer; the
/// economy never reads the clock, it exists for display and for deciding when
/// a season hand-over is due.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonClock {
    pub season: u32,
    pub day: u32,
    pub duration_days: u32,
}

impl Default for SeasonClock {
    fn default() -> Self {
        Self {
            season: 1,
            day: 0,
            duration_days: 28,
        }
    }
}

impl SeasonClock {
    pub fn advance_day(&mut self) {
        self.day += 1;
    }

    pub fn days_left(&self) -> u32 {
        self.duration_days.saturating_sub(self.day)
    }

    pub fn is_over(&self) -> bool {
        self.day >= self.duration_days
    }

    /// Chat-facing label, e.g. `Season 1 — 2 wk 3 d left`.
    pub fn label(&self) -> String {
        if self.is_over() {
            return format!("Season {} — over", self.season);
        }
        let left = self.days_left();
        let weeks = left / 7;
        let days = left % 7;
        let mut parts = Vec::new();
        if weeks > 0 {
            parts.push(format!("{} wk", weeks));
        }
        if days > 0 {
            parts.push(format!("{} d", days));
        }
        if parts.is_empty() {
            parts.push("less than a day".to_string());
        }
        format!("Season {} — {} left", self.season, parts.join(" "))
    }
}
