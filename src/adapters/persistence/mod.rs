//! Storage adapters. Both implement every outbound port.

pub mod memory_store;
pub mod sqlite_repo;

pub use memory_store::InMemoryStore;
pub use sqlite_repo::SqliteRepo;
