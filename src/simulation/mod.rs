pub mod catalog;
pub mod economy;
pub mod season;

pub use catalog::Catalog;
pub use economy::{
    award_experience, complete_task, progress_summary, redeem_reward, EconomyError, LevelUp,
    Redemption, TaskCompletion,
};
pub use season::SeasonClock;
