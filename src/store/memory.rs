use crate::core::serialization::SavedUser;
use crate::store::repository::LedgerRepository;
use crate::store::sqlite::LedgerDbState;

/// Ledger store held entirely in memory. Backs tests and ephemeral runs
/// where nothing should touch disk.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    state: LedgerDbState,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerRepository for MemoryLedgerStore {
    fn load_or_init(&mut self) -> Result<LedgerDbState, Box<dyn std::error::Error>> {
        Ok(self.state.clone())
    }

    fn save_state(&mut self, state: &LedgerDbState) -> Result<(), Box<dyn std::error::Error>> {
        self.state = state.clone();
        Ok(())
    }

    fn upsert_user(&mut self, user: &SavedUser) -> Result<(), Box<dyn std::error::Error>> {
        match self
            .state
            .users
            .iter_mut()
            .find(|existing| existing.user_id == user.user_id)
        {
            Some(existing) => *existing = user.clone(),
            None => {
                self.state.users.push(user.clone());
                self.state.users.sort_by_key(|user| user.user_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::season::SeasonClock;

    fn user(user_id: i64, experience: i64) -> SavedUser {
        SavedUser {
            user_id,
            experience,
            level: 1,
            balances: Default::default(),
            task_filters: Default::default(),
            reward_filters: Default::default(),
            completed: Vec::new(),
        }
    }

    #[test]
    fn starts_empty_and_round_trips() {
        let mut store = MemoryLedgerStore::new();
        assert_eq!(store.load_or_init().unwrap(), LedgerDbState::default());

        let state = LedgerDbState {
            season: SeasonClock::default(),
            users: vec![user(1, 10)],
        };
        store.save_state(&state).unwrap();
        assert_eq!(store.load_or_init().unwrap(), state);
    }

    #[test]
    fn upsert_inserts_sorted_and_replaces() {
        let mut store = MemoryLedgerStore::new();
        store.upsert_user(&user(5, 1)).unwrap();
        store.upsert_user(&user(2, 1)).unwrap();
        store.upsert_user(&user(5, 99)).unwrap();

        let state = store.load_or_init().unwrap();
        let ids: Vec<i64> = state.users.iter().map(|user| user.user_id).collect();
        assert_eq!(ids, vec![2, 5]);
        assert_eq!(state.users[1].experience, 99);
    }
}
