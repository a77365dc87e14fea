//! Field Mapper: applies configured expressions to an asset
//!
//! For every configured field the mapper evaluates the field's expression
//! against the merged context (default variables overlaid with the asset's
//! metadata), normalizes the result and assigns it. Tags and collections are
//! resolved to stored entities through per-call `EntityResolver`s. An asset
//! that is already persisted is handed to `AssetRepository::update` once all
//! fields are assigned; a new asset is left to the creation flow.
//!
//! Errors abort the call at the field that failed. Fields assigned before
//! the failure keep their new values.

mod context;
mod resolver;


pub use context::{build_context, DefaultContext};
pub use resolver::EntityResolver;

use crate::config::{MappedField, MappingConfig, Settings};
use crate::expression::{scalar_text, type_name, EvalContext, EvalError, Evaluator};
use crate::model::{Asset, AssetCollection, MetaDataCollection, Tag, TITLE_MAX_LENGTH};
use crate::storage::{
    AssetRepository, EntityRepository, PersistenceManager, StorageError, StorageResult,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors from mapping metadata onto an asset
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("evaluating the {field} expression failed: {source}")]
    Evaluation {
        field: MappedField,
        #[source]
        source: EvalError,
    },

    #[error("the {field} expression must produce {expected}, got {found}")]
    TypeMismatch {
        field: MappedField,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

/// The storage collaborators a mapper writes through
#[derive(Clone)]
pub struct Repositories {
    pub tags: Arc<dyn EntityRepository<Tag>>,
    pub collections: Arc<dyn EntityRepository<AssetCollection>>,
    pub assets: Arc<dyn AssetRepository>,
    pub persistence: Arc<dyn PersistenceManager>,
}

impl Repositories {
    /// Use one store for every collaborator
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: EntityRepository<Tag>
            + EntityRepository<AssetCollection>
            + AssetRepository
            + PersistenceManager
            + 'static,
    {
        Self {
            tags: store.clone(),
            collections: store.clone(),
            assets: store.clone(),
            persistence: store,
        }
    }
}

/// Maps extracted metadata onto asset fields.
///
/// Holds no per-call state, so one instance can serve concurrent calls.
pub struct MetaDataMapper {
    mapping: MappingConfig,
    default_context: DefaultContext,
    evaluator: Arc<dyn Evaluator>,
    repositories: Repositories,
}

impl MetaDataMapper {
    pub fn new(settings: Settings, evaluator: Arc<dyn Evaluator>, repositories: Repositories) -> Self {
        Self {
            mapping: settings.metadata_mapping,
            default_context: DefaultContext::new(settings.default_context),
            evaluator,
            repositories,
        }
    }

    /// Apply every configured field expression to `asset`, then update the
    /// asset if it is already persisted.
    pub fn map_metadata(&self, asset: &mut Asset, metadata: &MetaDataCollection) -> MappingResult<()> {
        let context = build_context(self.default_context.variables(), metadata);
        let mut tag_resolver = EntityResolver::new(self.repositories.tags.as_ref());
        let mut collection_resolver = EntityResolver::new(self.repositories.collections.as_ref());

        if let Some(expression) = self.mapping.expression(MappedField::Title) {
            let title = self.evaluate_text(MappedField::Title, expression, &context)?;
            asset.set_title(truncate_chars(&title, TITLE_MAX_LENGTH));
        }

        if let Some(expression) = self.mapping.expression(MappedField::Caption) {
            let caption = self.evaluate_text(MappedField::Caption, expression, &context)?;
            asset.set_caption(caption);
        }

        if let Some(expression) = self.mapping.expression(MappedField::Tags) {
            let labels = self.evaluate_names(MappedField::Tags, expression, &context)?;
            let tags = labels
                .iter()
                .map(|label| tag_resolver.resolve(label))
                .collect::<StorageResult<Vec<_>>>()?;
            asset.set_tags(tags);
        }

        if let Some(expression) = self.mapping.expression(MappedField::Collections) {
            let titles = self.evaluate_names(MappedField::Collections, expression, &context)?;
            let collections = titles
                .iter()
                .map(|title| collection_resolver.resolve(title))
                .collect::<StorageResult<Vec<_>>>()?;
            asset.set_collections(collections);
        }

        if self.repositories.persistence.is_new_object(asset)? {
            tracing::debug!(asset = %asset.id, "new asset, leaving persistence to creation");
        } else {
            self.repositories.assets.update(asset)?;
            tracing::info!(asset = %asset.id, "updated asset from metadata");
        }

        Ok(())
    }

    fn evaluate(&self, field: MappedField, expression: &str, context: &EvalContext) -> MappingResult<Value> {
        tracing::debug!(%field, expression, "evaluating field expression");
        self.evaluator
            .evaluate(expression, context)
            .map_err(|source| MappingError::Evaluation { field, source })
    }

    fn evaluate_text(&self, field: MappedField, expression: &str, context: &EvalContext) -> MappingResult<String> {
        let value = self.evaluate(field, expression, context)?;
        scalar_text(&value).ok_or(MappingError::TypeMismatch {
            field,
            expected: "a scalar",
            found: type_name(&value),
        })
    }

    fn evaluate_names(&self, field: MappedField, expression: &str, context: &EvalContext) -> MappingResult<Vec<String>> {
        let items = match self.evaluate(field, expression, context)? {
            Value::Array(items) => items,
            other => {
                return Err(MappingError::TypeMismatch {
                    field,
                    expected: "a sequence",
                    found: type_name(&other),
                })
            }
        };

        let names = items
            .iter()
            .map(|item| {
                scalar_text(item).ok_or(MappingError::TypeMismatch {
                    field,
                    expected: "a sequence of scalars",
                    found: type_name(item),
                })
            })
            .collect::<MappingResult<Vec<_>>>()?;

        Ok(normalize_names(names))
    }
}

/// The first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Trim each name, drop blanks and repeats. First occurrence order is kept.
pub fn normalize_names(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
