//! Entity Resolver: get-or-create by name with a per-call cache

use crate::model::NamedEntity;
use crate::storage::{EntityRepository, StorageResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves names to entities of kind `E`, creating missing ones.
///
/// The cache lives exactly as long as the resolver, and the mapper builds
/// a fresh resolver for every `map_metadata` call. Within that lifetime a
/// name is looked up in the repository at most once and always resolves to
/// the same `Arc`.
pub struct EntityResolver<'r, E: NamedEntity> {
    repository: &'r dyn EntityRepository<E>,
    cache: HashMap<String, Arc<E>>,
}

impl<'r, E: NamedEntity> EntityResolver<'r, E> {
    pub fn new(repository: &'r dyn EntityRepository<E>) -> Self {
        Self {
            repository,
            cache: HashMap::new(),
        }
    }

    /// Resolve `name` (trimmed) to an entity.
    ///
    /// Callers filter out names that are empty after trimming.
    pub fn resolve(&mut self, name: &str) -> StorageResult<Arc<E>> {
        let name = name.trim();
        if let Some(entity) = self.cache.get(name) {
            tracing::debug!(kind = E::KIND, name, "resolved from cache");
            return Ok(Arc::clone(entity));
        }

        let entity = match self.repository.find_by_name(name)? {
            Some(existing) => {
                tracing::debug!(kind = E::KIND, name, "resolved existing entity");
                existing
            }
            None => {
                let created = self.repository.add(E::new(name))?;
                tracing::info!(kind = E::KIND, name, id = %created.id(), "created entity");
                created
            }
        };

        self.cache.insert(name.to_string(), Arc::clone(&entity));
        Ok(entity)
    }

    /// Number of distinct names resolved so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetCollection, Tag};
    use crate::storage::MemoryStore;

    #[test]
    fn creates_missing_entity_once() {
        let store = MemoryStore::new();
        let mut resolver = EntityResolver::<Tag>::new(&store);

        let first = resolver.resolve("sunset").unwrap();
        let second = resolver.resolve("sunset").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.tag_lookups("sunset"), 1);
        assert_eq!(store.tag_stats().adds, 1);
        assert_eq!(store.tag_count(), 1);
    }

    #[test]
    fn returns_existing_entity_without_adding() {
        let store = MemoryStore::new();
        let existing = store.seed_collection("Holidays");
        let mut resolver = EntityResolver::<AssetCollection>::new(&store);

        let resolved = resolver.resolve("Holidays").unwrap();

        assert!(Arc::ptr_eq(&existing, &resolved));
        assert_eq!(store.collection_stats().adds, 0);
    }

    #[test]
    fn trims_before_lookup_and_caching() {
        let store = MemoryStore::new();
        let mut resolver = EntityResolver::<Tag>::new(&store);

        let padded = resolver.resolve("  beach ").unwrap();
        let plain = resolver.resolve("beach").unwrap();

        assert_eq!(padded.label, "beach");
        assert!(Arc::ptr_eq(&padded, &plain));
        assert_eq!(store.tag_lookups("beach"), 1);
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        let mut resolver = EntityResolver::<Tag>::new(&store);

        let lower = resolver.resolve("sky").unwrap();
        let upper = resolver.resolve("Sky").unwrap();

        assert!(!Arc::ptr_eq(&lower, &upper));
        assert_eq!(store.tag_count(), 2);
    }

    #[test]
    fn fresh_resolver_starts_with_empty_cache() {
        let store = MemoryStore::new();
        EntityResolver::<Tag>::new(&store).resolve("sea").unwrap();

        let mut second = EntityResolver::<Tag>::new(&store);
        assert_eq!(second.cached(), 0);
        second.resolve("sea").unwrap();

        assert_eq!(store.tag_lookups("sea"), 2);
        assert_eq!(store.tag_stats().adds, 1, "second call finds the stored tag");
    }
}
