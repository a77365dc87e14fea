//! Settings: which expressions feed which asset fields, and the default
//! variables every expression can see
//!
//! Loaded once at startup from YAML:
//!
//! ```yaml
//! metadata_mapping:
//!   title: "Exif.title"
//!   tags: "Iptc.keywords | split(',')"
//! default_context:
//!   Site: { name: "Archive" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for settings loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// An asset field that can be fed by an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappedField {
    Title,
    Caption,
    Tags,
    Collections,
}

impl MappedField {
    pub const ALL: [MappedField; 4] = [
        MappedField::Title,
        MappedField::Caption,
        MappedField::Tags,
        MappedField::Collections,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Caption => "caption",
            Self::Tags => "tags",
            Self::Collections => "collections",
        }
    }
}

impl std::fmt::Display for MappedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field expressions. A missing entry leaves that field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<String>,
}

impl MappingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expression for a field
    pub fn with(mut self, field: MappedField, expression: impl Into<String>) -> Self {
        let slot = match field {
            MappedField::Title => &mut self.title,
            MappedField::Caption => &mut self.caption,
            MappedField::Tags => &mut self.tags,
            MappedField::Collections => &mut self.collections,
        };
        *slot = Some(expression.into());
        self
    }

    pub fn expression(&self, field: MappedField) -> Option<&str> {
        match field {
            MappedField::Title => self.title.as_deref(),
            MappedField::Caption => self.caption.as_deref(),
            MappedField::Tags => self.tags.as_deref(),
            MappedField::Collections => self.collections.as_deref(),
        }
    }

    /// Fields that have an expression configured
    pub fn configured_fields(&self) -> Vec<MappedField> {
        MappedField::ALL
            .into_iter()
            .filter(|field| self.expression(*field).is_some())
            .collect()
    }
}

/// Everything the mapper is configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub metadata_mapping: MappingConfig,
    /// Variables available to every expression, beneath the asset's metadata
    #[serde(default)]
    pub default_context: Map<String, Value>,
}

impl Settings {
    /// Parse settings from YAML text. Empty text yields default settings.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML settings file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml_str(&yaml)?;
        tracing::debug!(
            path = %path.display(),
            fields = ?settings.metadata_mapping.configured_fields(),
            "loaded settings"
        );
        Ok(settings)
    }
}
