//! Storage trait definitions

use crate::model::{Asset, NamedEntity};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Lookup-by-name repository for tags or collections.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait EntityRepository<E: NamedEntity>: Send + Sync {
    /// Find the entity whose name equals `name` exactly (case-sensitive)
    fn find_by_name(&self, name: &str) -> StorageResult<Option<Arc<E>>>;

    /// Register a new entity.
    ///
    /// Insert-if-absent: when an entity with the same name already exists
    /// (for example because a concurrent caller created it between our
    /// lookup and this call), nothing is inserted and the stored entity is
    /// returned instead. Either way the returned entity is the canonical one.
    fn add(&self, entity: E) -> StorageResult<Arc<E>>;
}

/// Writes already-persisted assets back to storage
pub trait AssetRepository: Send + Sync {
    /// Persist the current state of an existing asset
    fn update(&self, asset: &Asset) -> StorageResult<()>;
}

/// Knows whether an asset has been persisted yet
pub trait PersistenceManager: Send + Sync {
    /// True if the asset has no persisted identity yet
    fn is_new_object(&self, asset: &Asset) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
