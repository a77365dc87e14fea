//! A name created by someone else between our lookup and our insert must
//! resolve to their entity, not a duplicate.

mod common;

use common::Workspace;
use metamap::mapper::EntityResolver;
use metamap::{EntityRepository, NamedEntity, StorageResult, Tag};
use std::sync::Arc;

/// Repository whose lookups are stale: it never sees existing rows
struct StaleLookups<R> {
    inner: R,
}

impl<R: EntityRepository<Tag>> EntityRepository<Tag> for StaleLookups<R> {
    fn find_by_name(&self, _name: &str) -> StorageResult<Option<Arc<Tag>>> {
        Ok(None)
    }

    fn add(&self, entity: Tag) -> StorageResult<Arc<Tag>> {
        self.inner.add(entity)
    }
}

#[test]
fn losing_creator_receives_the_stored_entity() {
    let workspace = Workspace::new();
    let winner = workspace.open_store();
    let loser = StaleLookups {
        inner: workspace.open_store(),
    };

    let stored = EntityRepository::<Tag>::add(&winner, Tag::new("sunset")).unwrap();

    let mut resolver = EntityResolver::<Tag>::new(&loser);
    let resolved = resolver.resolve("sunset").unwrap();

    assert_eq!(resolved.id, stored.id);
    assert_eq!(resolved.name(), "sunset");
    assert_eq!(winner.list_tags().unwrap().len(), 1);
}
