use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::CatalogDataError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCatalog {
    pub schema_version: u32,
    pub tasks: Vec<Task>,
}

/// One completable chore. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    /// Emblems credited on completion, by currency code.
    #[serde(default)]
    pub emblems: BTreeMap<String, i64>,
    /// Battle-pass experience granted on completion.
    #[serde(default)]
    pub experience: i64,
}

/// Ordered: the task list sorts Easy before Normal before Hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl FromStr for Difficulty {
    type Err = CatalogDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(CatalogDataError::Validation(format!(
                "unknown difficulty {}",
                s
            ))),
        }
    }
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

pub fn load_task_catalog(path: impl AsRef<Path>) -> Result<TaskCatalog, CatalogDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CatalogDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog: TaskCatalog =
        serde_json::from_str(&raw).map_err(|source| CatalogDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    catalog.validate()?;
    Ok(catalog)
}

impl TaskCatalog {
    pub fn validate(&self) -> Result<(), CatalogDataError> {
        let mut ids = HashSet::new();
        for task in &self.tasks {
            if task.id.trim().is_empty() {
                return Err(CatalogDataError::Validation(
                    "task id cannot be empty".to_string(),
                ));
            }
            if !ids.insert(task.id.clone()) {
                return Err(CatalogDataError::Validation(format!(
                    "duplicate task id {}",
                    task.id
                )));
            }
            if task.name.trim().is_empty() {
                return Err(CatalogDataError::Validation(format!(
                    "task {} missing name",
                    task.id
                )));
            }
            if task.experience < 0 {
                return Err(CatalogDataError::Validation(format!(
                    "task {} has negative experience",
                    task.id
                )));
            }
            for (code, amount) in &task.emblems {
                if *amount <= 0 {
                    return Err(CatalogDataError::Validation(format!(
                        "task {} pays a non-positive amount of {}",
                        task.id, code
                    )));
                }
            }
        }
        Ok(())
    }
}
