pub mod memory;
pub mod repository;
pub mod sqlite;

pub use crate::store::memory::MemoryLedgerStore;
pub use crate::store::repository::LedgerRepository;
pub use crate::store::sqlite::{LedgerDb, LedgerDbError, LedgerDbState};
