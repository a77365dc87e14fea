//! Storage backends
//!
//! The mapper talks to storage only through the traits in this module.
//! `MemoryStore` keeps everything in process; `SqliteStore` persists to a
//! SQLite database file.

mod memory;
mod sqlite;
mod traits;

pub use memory::{MemoryStore, RepositoryStats};
pub use sqlite::SqliteStore;
pub use traits::{
    AssetRepository, EntityRepository, OpenStore, PersistenceManager, StorageError, StorageResult,
};
