pub mod affordability;
pub mod progression;
pub mod query;

pub use affordability::{can_afford, cost_total, first_shortfall};
pub use progression::{LevelCurve, ProgressSummary, ProgressionConfig, BAR_WIDTH};
pub use query::{
    filter_rewards, filter_tasks, paginate, Page, RewardFilters, RewardSort, TaskFilters,
    TaskSort, PAGE_SIZE,
};
