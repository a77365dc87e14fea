//! Asset: the mutable target of metadata mapping

use super::entity::{AssetCollection, NamedEntity, Tag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Maximum title length, in characters
pub const TITLE_MAX_LENGTH: usize = 255;

/// Unique identifier for an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Create a new random AssetId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an AssetId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AssetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Asset bookkeeping timestamps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetTimestamps {
    /// When the asset was created
    pub created_at: Option<DateTime<Utc>>,
    /// When the asset was last written by an update
    pub modified_at: Option<DateTime<Utc>>,
}

/// A media asset.
///
/// Whether the asset is new or already persisted is owned by the storage
/// layer (see `PersistenceManager`), not by the asset itself.
#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub id: AssetId,
    title: String,
    caption: String,
    tags: Vec<Arc<Tag>>,
    collections: Vec<Arc<AssetCollection>>,
    pub timestamps: AssetTimestamps,
}

impl Asset {
    /// Create a new, empty asset
    pub fn new() -> Self {
        Self::with_id(AssetId::new())
    }

    pub fn with_id(id: AssetId) -> Self {
        Self {
            id,
            title: String::new(),
            caption: String::new(),
            tags: Vec::new(),
            collections: Vec::new(),
            timestamps: AssetTimestamps {
                created_at: Some(Utc::now()),
                ..Default::default()
            },
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the title. Callers are expected to respect `TITLE_MAX_LENGTH`.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    pub fn tags(&self) -> &[Arc<Tag>] {
        &self.tags
    }

    /// Replace the whole tag set. Repeated labels keep their first occurrence.
    pub fn set_tags(&mut self, tags: impl IntoIterator<Item = Arc<Tag>>) {
        self.tags = unique_by_name(tags);
    }

    pub fn collections(&self) -> &[Arc<AssetCollection>] {
        &self.collections
    }

    /// Replace the whole collection set. Repeated titles keep their first occurrence.
    pub fn set_collections(&mut self, collections: impl IntoIterator<Item = Arc<AssetCollection>>) {
        self.collections = unique_by_name(collections);
    }

    /// Tag labels in assignment order
    pub fn tag_labels(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name()).collect()
    }

    /// Collection titles in assignment order
    pub fn collection_titles(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name()).collect()
    }
}

impl Default for Asset {
    fn default() -> Self {
        Self::new()
    }
}

fn unique_by_name<E: NamedEntity>(entities: impl IntoIterator<Item = Arc<E>>) -> Vec<Arc<E>> {
    let mut seen = HashSet::new();
    entities
        .into_iter()
        .filter(|e| seen.insert(e.name().to_string()))
        .collect()
}
