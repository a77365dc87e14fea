//! Name-identified entities: tags (Label-entities) and asset collections
//! (Group-entities)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tag or a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Create a new random EntityId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an EntityId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entity that is looked up, and created on first use, by a unique name.
///
/// Names are compared exactly (case-sensitive). Callers trim before
/// constructing or looking up.
pub trait NamedEntity: std::fmt::Debug + Send + Sync + 'static {
    /// Human-readable kind, used in logs and errors
    const KIND: &'static str;

    /// Construct a brand-new, not yet persisted entity
    fn new(name: impl Into<String>) -> Self;

    /// Rebuild an entity that was loaded from storage
    fn restore(id: EntityId, name: impl Into<String>) -> Self;

    fn id(&self) -> EntityId;

    fn name(&self) -> &str;
}

/// A tag, identified by its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub label: String,
}

impl NamedEntity for Tag {
    const KIND: &'static str = "tag";

    fn new(label: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            label: label.into(),
        }
    }

    fn restore(id: EntityId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// An asset collection, identified by its title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCollection {
    pub id: EntityId,
    pub title: String,
}

impl NamedEntity for AssetCollection {
    const KIND: &'static str = "collection";

    fn new(title: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            title: title.into(),
        }
    }

    fn restore(id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.title
    }
}
