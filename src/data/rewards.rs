use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::CatalogDataError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardCatalog {
    pub schema_version: u32,
    pub rewards: Vec<Reward>,
}

/// One redeemable shop entry. Immutable after load.
///
/// Tangible rewards are fulfilled outside the ledger (a real-world item or
/// favor); redeeming one only debits emblems and raises a fulfillment
/// notification for the user and the overseer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    /// Price by currency code. Every entry must be covered to redeem.
    pub cost: BTreeMap<String, i64>,
    #[serde(default)]
    pub tangible: bool,
}

pub fn load_reward_catalog(path: impl AsRef<Path>) -> Result<RewardCatalog, CatalogDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CatalogDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog: RewardCatalog =
        serde_json::from_str(&raw).map_err(|source| CatalogDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    catalog.validate()?;
    Ok(catalog)
}

impl RewardCatalog {
    pub fn validate(&self) -> Result<(), CatalogDataError> {
        let mut ids = HashSet::new();
        for reward in &self.rewards {
            if reward.id.trim().is_empty() {
                return Err(CatalogDataError::Validation(
                    "reward id cannot be empty".to_string(),
                ));
            }
            if !ids.insert(reward.id.clone()) {
                return Err(CatalogDataError::Validation(format!(
                    "duplicate reward id {}",
                    reward.id
                )));
            }
            if reward.name.trim().is_empty() {
                return Err(CatalogDataError::Validation(format!(
                    "reward {} missing name",
                    reward.id
                )));
            }
            if reward.cost.is_empty() {
                return Err(CatalogDataError::Validation(format!(
                    "reward {} has no cost",
                    reward.id
                )));
            }
            for (code, amount) in &reward.cost {
                if *amount <= 0 {
                    return Err(CatalogDataError::Validation(format!(
                        "reward {} costs a non-positive amount of {}",
                        reward.id, code
                    )));
                }
            }
        }
        Ok(())
    }
}
