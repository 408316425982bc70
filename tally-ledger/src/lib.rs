//! Storage backends for the Tally ledger of proposals, partners and payments.

mod memory;
mod sqlite;
mod store;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::LedgerStore;
