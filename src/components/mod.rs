pub mod profile;

pub use profile::{Balances, Ledger, SearchMode, SearchTarget, TaskHistory, UserId};
