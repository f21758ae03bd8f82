use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::CatalogDataError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattlePassCatalog {
    pub schema_version: u32,
    pub tiers: Vec<PassTier>,
}

/// Payout for reaching one battle-pass level. Levels without a tier pay
/// nothing; the level still counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassTier {
    pub level: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Emblems credited when the level is reached. Ignored for tangible tiers.
    #[serde(default)]
    pub emblems: BTreeMap<String, i64>,
    /// Tangible tiers are delivered outside the ledger and only raise a
    /// notification; nothing is credited.
    #[serde(default)]
    pub tangible: bool,
}

pub fn load_battle_pass_catalog(
    path: impl AsRef<Path>,
) -> Result<BattlePassCatalog, CatalogDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CatalogDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog: BattlePassCatalog =
        serde_json::from_str(&raw).map_err(|source| CatalogDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    catalog.validate()?;
    Ok(catalog)
}

impl BattlePassCatalog {
    pub fn validate(&self) -> Result<(), CatalogDataError> {
        let mut levels = HashSet::new();
        for tier in &self.tiers {
            if tier.level == 0 {
                return Err(CatalogDataError::Validation(
                    "tier level 0 is not reachable by a payout".to_string(),
                ));
            }
            if !levels.insert(tier.level) {
                return Err(CatalogDataError::Validation(format!(
                    "duplicate tier for level {}",
                    tier.level
                )));
            }
            if tier.name.trim().is_empty() {
                return Err(CatalogDataError::Validation(format!(
                    "tier {} missing name",
                    tier.level
                )));
            }
            if tier.tangible && !tier.emblems.is_empty() {
                return Err(CatalogDataError::Validation(format!(
                    "tier {} is tangible but also pays emblems",
                    tier.level
                )));
            }
            for (code, amount) in &tier.emblems {
                if *amount <= 0 {
                    return Err(CatalogDataError::Validation(format!(
                        "tier {} pays a non-positive amount of {}",
                        tier.level, code
                    )));
                }
            }
        }
        Ok(())
    }

    /// Tier defined for `level`, if any.
    pub fn tier_for_level(&self, level: u32) -> Option<&PassTier> {
        self.tiers.iter().find(|tier| tier.level == level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(level: u32) -> PassTier {
        PassTier {
            level,
            name: format!("Tier {}", level),
            description: String::new(),
            emblems: BTreeMap::from([("FIN".to_string(), 1)]),
            tangible: false,
        }
    }

    #[test]
    fn duplicate_levels_are_rejected() {
        let catalog = BattlePassCatalog {
            schema_version: 1,
            tiers: vec![tier(3), tier(3)],
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn level_zero_is_rejected() {
        let catalog = BattlePassCatalog {
            schema_version: 1,
            tiers: vec![tier(0)],
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn tangible_tiers_cannot_also_pay_emblems() {
        let mut bad = tier(5);
        bad.tangible = true;
        let catalog = BattlePassCatalog {
            schema_version: 1,
            tiers: vec![bad],
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn gaps_are_allowed() {
        let catalog = BattlePassCatalog {
            schema_version: 1,
            tiers: vec![tier(1), tier(5)],
        };
        assert!(catalog.validate().is_ok());
        assert!(catalog.tier_for_level(3).is_none());
        assert_eq!(catalog.tier_for_level(5).unwrap().level, 5);
    }
}
