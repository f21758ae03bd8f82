use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Width of the textual progress bar rendered by [`ProgressSummary`].
pub const BAR_WIDTH: usize = 12;

/// Season pass leveling strategy.
///
/// Both variants describe how much experience separates one level from the
/// next; the cascade logic on top of them is shared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelCurve {
    /// Flat cost per level. Ledgers on this curve start at level 0.
    Linear { rp_per_level: i64 },
    /// Cost grows by a fixed factor each level. Ledgers start at level 1.
    Geometric { base_xp: i64, growth: f64 },
}

impl LevelCurve {
    /// Experience needed to advance from `level` to `level + 1`.
    pub fn xp_to_advance(&self, level: u32) -> i64 {
        match self {
            LevelCurve::Linear { rp_per_level } => *rp_per_level,
            LevelCurve::Geometric { base_xp, growth } => {
                let exponent = level.saturating_sub(1) as i32;
                (*base_xp as f64 * growth.powi(exponent)) as i64
            }
        }
    }

    /// Cumulative experience required to reach `level` from the starting level.
    pub fn threshold_for_level(&self, level: u32) -> i64 {
        match self {
            LevelCurve::Linear { rp_per_level } => *rp_per_level * level as i64,
            LevelCurve::Geometric { .. } => {
                let mut total = 0;
                for step in self.starting_level()..level {
                    total += self.xp_to_advance(step);
                }
                total
            }
        }
    }

    /// Level a fresh ledger begins at.
    pub fn starting_level(&self) -> u32 {
        match self {
            LevelCurve::Linear { .. } => 0,
            LevelCurve::Geometric { .. } => 1,
        }
    }
}

/// Resource selecting the leveling strategy and the season cap.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    pub curve: LevelCurve,
    pub max_level: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        // The shipped season: +3% per level, tuned for a ~28 day run.
        Self {
            curve: LevelCurve::Geometric {
                base_xp: 50,
                growth: 1.03,
            },
            max_level: 50,
        }
    }
}

impl ProgressionConfig {
    /// Level implied by a cumulative experience total, clamped to the cap.
    pub fn level_for_experience(&self, experience: i64) -> u32 {
        let mut level = self.curve.starting_level();
        while level < self.max_level
            && experience >= self.curve.threshold_for_level(level + 1)
        {
            level += 1;
        }
        level
    }
}

/// Read-only view of where a ledger sits inside its current level.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    pub level: u32,
    pub in_level: i64,
    pub needed_in_level: i64,
    pub remaining: i64,
    pub at_max: bool,
}

impl ProgressSummary {
    pub fn compute(experience: i64, level: u32, config: &ProgressionConfig) -> Self {
        if level >= config.max_level {
            return Self {
                level: config.max_level,
                in_level: 0,
                needed_in_level: 0,
                remaining: 0,
                at_max: true,
            };
        }
        let floor = config.curve.threshold_for_level(level);
        let ceiling = config.curve.threshold_for_level(level + 1);
        let needed_in_level = ceiling - floor;
        let in_level = (experience - floor).clamp(0, needed_in_level);
        Self {
            level,
            in_level,
            needed_in_level,
            remaining: needed_in_level - in_level,
            at_max: false,
        }
    }

    /// Block bar in the style of the chat view, e.g. `[████░░░░░░░░]`.
    pub fn bar(&self) -> String {
        let filled = if self.at_max || self.needed_in_level == 0 {
            BAR_WIDTH
        } else {
            ((self.in_level as f64 / self.needed_in_level as f64) * BAR_WIDTH as f64) as usize
        };
        let filled = filled.min(BAR_WIDTH);
        let mut bar = String::with_capacity(BAR_WIDTH * 3);
        for _ in 0..filled {
            bar.push('█');
        }
        for _ in filled..BAR_WIDTH {
            bar.push('░');
        }
        bar
    }
}
