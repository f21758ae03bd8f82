pub mod battle_pass;
pub mod rewards;
pub mod tasks;

pub use battle_pass::{load_battle_pass_catalog, BattlePassCatalog, PassTier};
pub use rewards::{load_reward_catalog, Reward, RewardCatalog};
pub use tasks::{load_task_catalog, Difficulty, Task, TaskCatalog};

/// Error raised while loading or validating a catalog file.
#[derive(Debug)]
pub enum CatalogDataError {
    Io { path: String, source: std::io::Error },
    Json { path: String, source: serde_json::Error },
    Validation(String),
}

impl std::fmt::Display for CatalogDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogDataError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path, source)
            }
            CatalogDataError::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path, source)
            }
            CatalogDataError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CatalogDataError {}
