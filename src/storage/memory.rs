//! In-process storage backend
//!
//! Everything lives in `DashMap`s. The store also records how often each
//! name was looked up and how many entities were added, which makes it the
//! recording double for mapper tests.

use super::traits::{AssetRepository, EntityRepository, PersistenceManager, StorageError, StorageResult};
use crate::model::{Asset, AssetCollection, AssetId, NamedEntity, Tag};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Call counters for one entity repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    /// `find_by_name` calls
    pub lookups: usize,
    /// `add` calls, including ones that found an existing entity
    pub adds: usize,
}

struct EntityTable<E> {
    entries: DashMap<String, Arc<E>>,
    lookups: DashMap<String, usize>,
    adds: AtomicUsize,
}

impl<E> Default for EntityTable<E> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            lookups: DashMap::new(),
            adds: AtomicUsize::new(0),
        }
    }
}

impl<E: NamedEntity> EntityTable<E> {
    fn find(&self, name: &str) -> Option<Arc<E>> {
        *self.lookups.entry(name.to_string()).or_insert(0) += 1;
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    fn add(&self, entity: E) -> Arc<E> {
        self.adds.fetch_add(1, Ordering::Relaxed);
        let name = entity.name().to_string();
        self.entries
            .entry(name)
            .or_insert_with(move || Arc::new(entity))
            .value()
            .clone()
    }

    /// Insert without touching the counters
    fn seed(&self, name: &str) -> Arc<E> {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(E::new(name)))
            .value()
            .clone()
    }

    fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            lookups: self.lookups.iter().map(|entry| *entry.value()).sum(),
            adds: self.adds.load(Ordering::Relaxed),
        }
    }

    fn lookups_of(&self, name: &str) -> usize {
        self.lookups.get(name).map(|entry| *entry.value()).unwrap_or(0)
    }
}

/// In-memory store implementing every repository trait
#[derive(Default)]
pub struct MemoryStore {
    tags: EntityTable<Tag>,
    collections: EntityTable<AssetCollection>,
    assets: DashMap<AssetId, Asset>,
    updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a new asset (the creation flow). Afterwards the asset is no
    /// longer new.
    pub fn insert_asset(&self, asset: &Asset) {
        self.assets.insert(asset.id, asset.clone());
    }

    pub fn get_asset(&self, id: &AssetId) -> Option<Asset> {
        self.assets.get(id).map(|entry| entry.value().clone())
    }

    /// Make a tag exist before a test runs, without counting it as an add
    pub fn seed_tag(&self, label: &str) -> Arc<Tag> {
        self.tags.seed(label)
    }

    /// Make a collection exist before a test runs, without counting it as an add
    pub fn seed_collection(&self, title: &str) -> Arc<AssetCollection> {
        self.collections.seed(title)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.entries.len()
    }

    pub fn collection_count(&self) -> usize {
        self.collections.entries.len()
    }

    pub fn tag_stats(&self) -> RepositoryStats {
        self.tags.stats()
    }

    pub fn collection_stats(&self) -> RepositoryStats {
        self.collections.stats()
    }

    /// How many times `label` was looked up in the tag repository
    pub fn tag_lookups(&self, label: &str) -> usize {
        self.tags.lookups_of(label)
    }

    /// How many times `title` was looked up in the collection repository
    pub fn collection_lookups(&self, title: &str) -> usize {
        self.collections.lookups_of(title)
    }

    /// Number of `update` calls so far
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }
}

impl EntityRepository<Tag> for MemoryStore {
    fn find_by_name(&self, name: &str) -> StorageResult<Option<Arc<Tag>>> {
        Ok(self.tags.find(name))
    }

    fn add(&self, entity: Tag) -> StorageResult<Arc<Tag>> {
        Ok(self.tags.add(entity))
    }
}

impl EntityRepository<AssetCollection> for MemoryStore {
    fn find_by_name(&self, name: &str) -> StorageResult<Option<Arc<AssetCollection>>> {
        Ok(self.collections.find(name))
    }

    fn add(&self, entity: AssetCollection) -> StorageResult<Arc<AssetCollection>> {
        Ok(self.collections.add(entity))
    }
}

impl AssetRepository for MemoryStore {
    fn update(&self, asset: &Asset) -> StorageResult<()> {
        let mut stored = self
            .assets
            .get_mut(&asset.id)
            .ok_or_else(|| StorageError::AssetNotFound(asset.id.to_string()))?;
        let mut updated = asset.clone();
        updated.timestamps.modified_at = Some(Utc::now());
        *stored = updated;
        self.updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl PersistenceManager for MemoryStore {
    fn is_new_object(&self, asset: &Asset) -> StorageResult<bool> {
        Ok(!self.assets.contains_key(&asset.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_insert_if_absent() {
        let store = MemoryStore::new();
        let first = EntityRepository::<Tag>::add(&store, Tag::new("sunset")).unwrap();
        let second = EntityRepository::<Tag>::add(&store, Tag::new("sunset")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.tag_count(), 1);
        assert_eq!(store.tag_stats().adds, 2);
    }

    #[test]
    fn find_by_name_is_exact_and_counted() {
        let store = MemoryStore::new();
        store.seed_tag("Sunset");

        let hit = EntityRepository::<Tag>::find_by_name(&store, "Sunset").unwrap();
        let miss = EntityRepository::<Tag>::find_by_name(&store, "sunset").unwrap();

        assert!(hit.is_some());
        assert!(miss.is_none());
        assert_eq!(store.tag_lookups("Sunset"), 1);
        assert_eq!(store.tag_lookups("sunset"), 1);
        assert_eq!(store.tag_stats(), RepositoryStats { lookups: 2, adds: 0 });
    }

    #[test]
    fn tags_and_collections_are_separate_namespaces() {
        let store = MemoryStore::new();
        store.seed_tag("travel");

        let collection =
            EntityRepository::<AssetCollection>::find_by_name(&store, "travel").unwrap();
        assert!(collection.is_none());
        assert_eq!(store.collection_count(), 0);
    }

    #[test]
    fn assets_are_new_until_inserted() {
        let store = MemoryStore::new();
        let asset = Asset::new();

        assert!(store.is_new_object(&asset).unwrap());
        assert!(matches!(store.update(&asset), Err(StorageError::AssetNotFound(_))));

        store.insert_asset(&asset);
        assert!(!store.is_new_object(&asset).unwrap());
    }

    #[test]
    fn update_replaces_stored_state() {
        let store = MemoryStore::new();
        let mut asset = Asset::new();
        store.insert_asset(&asset);

        asset.set_title("renamed");
        store.update(&asset).unwrap();

        let stored = store.get_asset(&asset.id).unwrap();
        assert_eq!(stored.title(), "renamed");
        assert!(stored.timestamps.modified_at.is_some());
        assert_eq!(store.update_count(), 1);
    }
}
