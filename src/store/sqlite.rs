use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::components::profile::Balances;
use crate::core::serialization::SavedUser;
use crate::rules::query::{RewardFilters, RewardSort, TaskFilters, TaskSort};
use crate::simulation::season::SeasonClock;

const LEDGER_SCHEMA_VERSION: i64 = 1;
const LEDGER_SAVE_VERSION: i64 = 1;

const LEDGER_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ledger_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL,
  save_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS season (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  season INTEGER NOT NULL,
  day INTEGER NOT NULL,
  duration_days INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
  user_id INTEGER PRIMARY KEY,
  experience INTEGER NOT NULL,
  level INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS balances (
  user_id INTEGER NOT NULL,
  emblem TEXT NOT NULL,
  amount INTEGER NOT NULL,
  PRIMARY KEY (user_id, emblem)
);

CREATE TABLE IF NOT EXISTS task_filters (
  user_id INTEGER PRIMARY KEY,
  category TEXT,
  query TEXT,
  emblem TEXT,
  sort TEXT NOT NULL,
  page INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS reward_filters (
  user_id INTEGER PRIMARY KEY,
  category TEXT,
  query TEXT,
  affordable_only INTEGER NOT NULL,
  sort TEXT NOT NULL,
  page INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS completed_tasks (
  user_id INTEGER NOT NULL,
  seq INTEGER NOT NULL,
  task_id TEXT NOT NULL,
  PRIMARY KEY (user_id, seq)
);
"#;

#[derive(Debug)]
pub enum LedgerDbError {
    Sqlite(rusqlite::Error),
    InvalidData(String),
}

impl std::fmt::Display for LedgerDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerDbError::Sqlite(err) => write!(f, "sqlite error: {}", err),
            LedgerDbError::InvalidData(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for LedgerDbError {}

impl From<rusqlite::Error> for LedgerDbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

/// Everything the store persists: the season clock and all user ledgers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerDbState {
    pub season: SeasonClock,
    pub users: Vec<SavedUser>,
}

fn task_sort_to_str(sort: TaskSort) -> &'static str {
    match sort {
        TaskSort::Id => "id",
        TaskSort::Difficulty => "difficulty",
    }
}

fn task_sort_from_str(value: &str) -> Result<TaskSort, LedgerDbError> {
    match value {
        "id" => Ok(TaskSort::Id),
        "difficulty" => Ok(TaskSort::Difficulty),
        _ => Err(LedgerDbError::InvalidData(format!(
            "unknown task sort {}",
            value
        ))),
    }
}

fn reward_sort_to_str(sort: RewardSort) -> &'static str {
    match sort {
        RewardSort::Id => "id",
        RewardSort::Cost => "cost",
    }
}

fn reward_sort_from_str(value: &str) -> Result<RewardSort, LedgerDbError> {
    match value {
        "id" => Ok(RewardSort::Id),
        "cost" => Ok(RewardSort::Cost),
        _ => Err(LedgerDbError::InvalidData(format!(
            "unknown reward sort {}",
            value
        ))),
    }
}

pub struct LedgerDb {
    conn: Connection,
}

impl LedgerDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerDbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.conn.execute_batch(LEDGER_DB_SCHEMA)?;
        db.ensure_meta()?;
        Ok(db)
    }

    fn ensure_meta(&self) -> Result<(), LedgerDbError> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT schema_version FROM ledger_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        match existing {
            Some(version) if version != LEDGER_SCHEMA_VERSION => {
                Err(LedgerDbError::InvalidData(format!(
                    "ledger db schema version {} is not supported",
                    version
                )))
            }
            Some(_) => Ok(()),
            None => {
                self.conn.execute(
                    "INSERT INTO ledger_meta (id, schema_version, save_version) VALUES (1, ?1, ?2)",
                    params![LEDGER_SCHEMA_VERSION, LEDGER_SAVE_VERSION],
                )?;
                Ok(())
            }
        }
    }

    pub fn load_or_init(&mut self) -> Result<LedgerDbState, LedgerDbError> {
        if let Some(state) = self.load_state()? {
            Ok(state)
        } else {
            let state = LedgerDbState::default();
            self.save_state(&state)?;
            Ok(state)
        }
    }

    pub fn load_state(&self) -> Result<Option<LedgerDbState>, LedgerDbError> {
        let season = self
            .conn
            .query_row(
                "SELECT season, day, duration_days FROM season WHERE id = 1",
                [],
                |row| {
                    Ok(SeasonClock {
                        season: row.get::<_, i64>(0)? as u32,
                        day: row.get::<_, i64>(1)? as u32,
                        duration_days: row.get::<_, i64>(2)? as u32,
                    })
                },
            )
            .optional()?;
        let Some(season) = season else {
            return Ok(None);
        };

        let balances = self.load_balances()?;
        let task_filters = self.load_task_filters()?;
        let reward_filters = self.load_reward_filters()?;
        let completed = self.load_completed()?;

        let mut stmt = self
            .conn
            .prepare("SELECT user_id, experience, level FROM users ORDER BY user_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut users = Vec::new();
        for row in rows {
            let (user_id, experience, level) = row?;
            users.push(SavedUser {
                user_id,
                experience,
                level: level as u32,
                balances: balances.get(&user_id).cloned().unwrap_or_default(),
                task_filters: task_filters.get(&user_id).cloned().unwrap_or_default(),
                reward_filters: reward_filters.get(&user_id).cloned().unwrap_or_default(),
                completed: completed.get(&user_id).cloned().unwrap_or_default(),
            });
        }

        Ok(Some(LedgerDbState { season, users }))
    }

    pub fn save_state(&mut self, state: &LedgerDbState) -> Result<(), LedgerDbError> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM season", [])?;
        tx.execute(
            "INSERT INTO season (id, season, day, duration_days) VALUES (1, ?1, ?2, ?3)",
            params![
                state.season.season as i64,
                state.season.day as i64,
                state.season.duration_days as i64
            ],
        )?;

        tx.execute("DELETE FROM users", [])?;
        tx.execute("DELETE FROM balances", [])?;
        tx.execute("DELETE FROM task_filters", [])?;
        tx.execute("DELETE FROM reward_filters", [])?;
        tx.execute("DELETE FROM completed_tasks", [])?;

        for user in &state.users {
            insert_user(&tx, user)?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn upsert_user(&mut self, user: &SavedUser) -> Result<(), LedgerDbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM users WHERE user_id = ?1", params![user.user_id])?;
        tx.execute(
            "DELETE FROM balances WHERE user_id = ?1",
            params![user.user_id],
        )?;
        tx.execute(
            "DELETE FROM task_filters WHERE user_id = ?1",
            params![user.user_id],
        )?;
        tx.execute(
            "DELETE FROM reward_filters WHERE user_id = ?1",
            params![user.user_id],
        )?;
        tx.execute(
            "DELETE FROM completed_tasks WHERE user_id = ?1",
            params![user.user_id],
        )?;
        insert_user(&tx, user)?;
        tx.commit()?;
        Ok(())
    }

    fn load_balances(&self) -> Result<HashMap<i64, Balances>, LedgerDbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, emblem, amount FROM balances")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut out: HashMap<i64, Balances> = HashMap::new();
        for row in rows {
            let (user_id, emblem, amount) = row?;
            out.entry(user_id).or_default().credit(&emblem, amount);
        }
        Ok(out)
    }

    fn load_task_filters(&self) -> Result<HashMap<i64, TaskFilters>, LedgerDbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, category, query, emblem, sort, page FROM task_filters")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut out = HashMap::new();
        for row in rows {
            let (user_id, category, query, emblem, sort, page) = row?;
            out.insert(
                user_id,
                TaskFilters {
                    category,
                    query,
                    emblem,
                    sort: task_sort_from_str(&sort)?,
                    page: page.max(0) as usize,
                },
            );
        }
        Ok(out)
    }

    fn load_reward_filters(&self) -> Result<HashMap<i64, RewardFilters>, LedgerDbError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, category, query, affordable_only, sort, page FROM reward_filters",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut out = HashMap::new();
        for row in rows {
            let (user_id, category, query, affordable_only, sort, page) = row?;
            out.insert(
                user_id,
                RewardFilters {
                    category,
                    query,
                    affordable_only: affordable_only != 0,
                    sort: reward_sort_from_str(&sort)?,
                    page: page.max(0) as usize,
                },
            );
        }
        Ok(out)
    }

    fn load_completed(&self) -> Result<HashMap<i64, Vec<String>>, LedgerDbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, task_id FROM completed_tasks ORDER BY user_id, seq")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out: HashMap<i64, Vec<String>> = HashMap::new();
        for row in rows {
            let (user_id, task_id) = row?;
            out.entry(user_id).or_default().push(task_id);
        }
        Ok(out)
    }
}

impl crate::store::repository::LedgerRepository for LedgerDb {
    fn load_or_init(&mut self) -> Result<LedgerDbState, Box<dyn std::error::Error>> {
        Ok(LedgerDb::load_or_init(self)?)
    }

    fn save_state(&mut self, state: &LedgerDbState) -> Result<(), Box<dyn std::error::Error>> {
        Ok(LedgerDb::save_state(self, state)?)
    }

    fn upsert_user(&mut self, user: &SavedUser) -> Result<(), Box<dyn std::error::Error>> {
        Ok(LedgerDb::upsert_user(self, user)?)
    }
}

fn insert_user(tx: &rusqlite::Transaction<'_>, user: &SavedUser) -> Result<(), LedgerDbError> {
    tx.execute(
        "INSERT INTO users (user_id, experience, level) VALUES (?1, ?2, ?3)",
        params![user.user_id, user.experience, user.level as i64],
    )?;
    for (emblem, amount) in user.balances.iter() {
        tx.execute(
            "INSERT INTO balances (user_id, emblem, amount) VALUES (?1, ?2, ?3)",
            params![user.user_id, emblem, amount],
        )?;
    }
    tx.execute(
        "INSERT INTO task_filters (user_id, category, query, emblem, sort, page) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.user_id,
            user.task_filters.category,
            user.task_filters.query,
            user.task_filters.emblem,
            task_sort_to_str(user.task_filters.sort),
            user.task_filters.page as i64
        ],
    )?;
    tx.execute(
        "INSERT INTO reward_filters (user_id, category, query, affordable_only, sort, page) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.user_id,
            user.reward_filters.category,
            user.reward_filters.query,
            if user.reward_filters.affordable_only { 1 } else { 0 },
            reward_sort_to_str(user.reward_filters.sort),
            user.reward_filters.page as i64
        ],
    )?;
    for (seq, task_id) in user.completed.iter().enumerate() {
        tx.execute(
            "INSERT INTO completed_tasks (user_id, seq, task_id) VALUES (?1, ?2, ?3)",
            params![user.user_id, seq as i64, task_id],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(user_id: i64) -> SavedUser {
        let mut balances = Balances::default();
        balances.credit("FIN", 3);
        balances.credit("HEART", 1);
        SavedUser {
            user_id,
            experience: 120,
            level: 3,
            balances,
            task_filters: TaskFilters {
                category: Some("dog".to_string()),
                query: None,
                emblem: Some("PAW".to_string()),
                sort: TaskSort::Difficulty,
                page: 1,
            },
            reward_filters: RewardFilters {
                category: None,
                query: Some("ice".to_string()),
                affordable_only: true,
                sort: RewardSort::Cost,
                page: 0,
            },
            completed: vec!["t1".to_string(), "t3".to_string(), "t1".to_string()],
        }
    }

    #[test]
    fn fresh_db_initializes_to_default_state() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut db = LedgerDb::open(file.path()).unwrap();
        let state = db.load_or_init().unwrap();
        assert_eq!(state, LedgerDbState::default());
    }

    #[test]
    fn save_and_load_round_trips() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut db = LedgerDb::open(file.path()).unwrap();

        let mut season = SeasonClock::default();
        season.advance_day();
        season.advance_day();
        let state = LedgerDbState {
            season,
            users: vec![sample_user(1), sample_user(42)],
        };
        db.save_state(&state).unwrap();

        let mut reopened = LedgerDb::open(file.path()).unwrap();
        let loaded = reopened.load_or_init().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn upsert_replaces_a_single_user() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut db = LedgerDb::open(file.path()).unwrap();
        db.save_state(&LedgerDbState {
            season: SeasonClock::default(),
            users: vec![sample_user(1), sample_user(2)],
        })
        .unwrap();

        let mut updated = sample_user(2);
        updated.experience = 999;
        updated.completed.push("t9".to_string());
        db.upsert_user(&updated).unwrap();

        let loaded = db.load_state().unwrap().unwrap();
        assert_eq!(loaded.users.len(), 2);
        assert_eq!(loaded.users[1], updated);
        assert_eq!(loaded.users[0], sample_user(1));
    }

    #[test]
    fn unknown_sort_text_is_invalid_data() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut db = LedgerDb::open(file.path()).unwrap();
        db.save_state(&LedgerDbState {
            season: SeasonClock::default(),
            users: vec![sample_user(1)],
        })
        .unwrap();
        db.conn
            .execute("UPDATE task_filters SET sort = 'velocity'", [])
            .unwrap();

        assert!(matches!(
            db.load_state(),
            Err(LedgerDbError::InvalidData(_))
        ));
    }
}
