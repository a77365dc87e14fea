//! Context Builder: default variables overlaid with per-asset metadata

use crate::expression::EvalContext;
use crate::model::MetaDataCollection;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Process-wide default variables.
///
/// The evaluation-ready context is computed from the configured map on first
/// use and cached for the lifetime of the value. `OnceLock` makes the first
/// computation single-shot under concurrent access; later reads take no lock.
#[derive(Debug, Default)]
pub struct DefaultContext {
    configured: Map<String, Value>,
    variables: OnceLock<EvalContext>,
}

impl DefaultContext {
    pub fn new(configured: Map<String, Value>) -> Self {
        Self {
            configured,
            variables: OnceLock::new(),
        }
    }

    pub fn variables(&self) -> &EvalContext {
        self.variables.get_or_init(|| {
            tracing::debug!(count = self.configured.len(), "initializing default context");
            EvalContext::from_map(self.configured.clone())
        })
    }

    /// Whether `variables()` has been computed yet
    pub fn is_initialized(&self) -> bool {
        self.variables.get().is_some()
    }
}

/// Overlay `metadata` onto a copy of `defaults`. Metadata wins on collision.
pub fn build_context(defaults: &EvalContext, metadata: &MetaDataCollection) -> EvalContext {
    let mut context = defaults.clone();
    for (key, value) in metadata.iter() {
        context.insert(key.clone(), value.clone());
    }
    context
}
