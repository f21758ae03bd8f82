use crate::core::serialization::SavedUser;
use crate::store::sqlite::LedgerDbState;

/// Durable home for user ledgers and the season clock. The engine never
/// calls this itself; the presentation layer persists after mutating ticks,
/// and a write failure must not roll back the in-memory state.
pub trait LedgerRepository {
    fn load_or_init(&mut self) -> Result<LedgerDbState, Box<dyn std::error::Error>>;
    fn save_state(&mut self, state: &LedgerDbState) -> Result<(), Box<dyn std::error::Error>>;
    fn upsert_user(&mut self, user: &SavedUser) -> Result<(), Box<dyn std::error::Error>>;
}
