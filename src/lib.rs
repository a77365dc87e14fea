//! metamap: expression-driven mapping of extracted media metadata onto assets
//!
//! Extracted metadata (EXIF, IPTC, ...) arrives as a `MetaDataCollection`.
//! A `MetaDataMapper` evaluates one configured expression per asset field
//! against that metadata, normalizes the results and writes them onto an
//! `Asset`, resolving tag labels and collection titles to stored entities
//! (created on first use).
//!
//! # Core Concepts
//!
//! - **Settings**: field → expression mapping plus default variables
//! - **Evaluator**: pluggable expression capability (`PathEvaluator` bundled)
//! - **Repositories**: storage seams (`MemoryStore`, `SqliteStore`)
//!
//! # Example
//!
//! ```
//! use metamap::{
//!     Asset, MappedField, MappingConfig, MemoryStore, MetaDataCollection, MetaDataMapper,
//!     PathEvaluator, Repositories, Settings,
//! };
//! use std::sync::Arc;
//!
//! let settings = Settings {
//!     metadata_mapping: MappingConfig::new().with(MappedField::Tags, "[Exif.label, 'photo']"),
//!     ..Default::default()
//! };
//! let store = Arc::new(MemoryStore::new());
//! let mapper = MetaDataMapper::new(
//!     settings,
//!     Arc::new(PathEvaluator::new()),
//!     Repositories::from_store(store),
//! );
//!
//! let mut asset = Asset::new();
//! let metadata = MetaDataCollection::new().with("Exif.label", "sunset");
//! mapper.map_metadata(&mut asset, &metadata).unwrap();
//! assert_eq!(asset.tag_labels(), vec!["sunset", "photo"]);
//! ```

pub mod config;
pub mod expression;
pub mod mapper;
mod model;
pub mod storage;

pub use config::{ConfigError, ConfigResult, MappedField, MappingConfig, Settings};
pub use expression::{EvalContext, EvalError, EvalResult, Evaluator, PathEvaluator};
pub use mapper::{MappingError, MappingResult, MetaDataMapper, Repositories};
pub use model::{
    Asset, AssetCollection, AssetId, AssetTimestamps, EntityId, MetaDataCollection, NamedEntity, Tag,
    TITLE_MAX_LENGTH,
};
pub use storage::{
    AssetRepository, EntityRepository, MemoryStore, OpenStore, PersistenceManager, SqliteStore,
    StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
